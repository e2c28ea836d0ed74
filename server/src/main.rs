use clap::Parser;
use server::network::{GameServer, ServerConfig};
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, binds the listener, and runs the server
/// loop until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Maximum number of concurrent players
        #[clap(short, long, default_value = "32")]
        max_clients: usize,
        /// Seconds of silence before an idle session is dropped (0 disables)
        #[clap(short, long, default_value = "60")]
        idle_timeout: u64,
    }

    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        max_clients: args.max_clients,
        idle_timeout: match args.idle_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
    };

    let address = format!("{}:{}", args.host, args.port);
    let server = GameServer::bind(&address, config).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
