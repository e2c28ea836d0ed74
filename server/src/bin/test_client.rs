use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use shared::{ClientEvent, ServerEvent, Vec3};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

fn encode(event: &ClientEvent) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(serde_json::to_string(event)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about = "Scripted smoke-test client")]
    struct Args {
        /// Server URL to connect to
        #[clap(default_value = "ws://127.0.0.1:8080")]
        url: String,
    }

    let args = Args::parse();

    println!("Connecting to {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    let (mut sink, mut source) = ws_stream.split();

    // Wait for the bootstrap snapshot
    println!("Waiting for init snapshot...");
    let mut my_id = None;
    let mut target = None;

    while let Some(frame) = source.next().await {
        if let Message::Text(text) = frame? {
            match serde_json::from_str::<ServerEvent>(&text)? {
                ServerEvent::Init {
                    player_id,
                    players,
                    bullets,
                    grenades,
                } => {
                    println!(
                        "Connected as player {} ({} players, {} bullets, {} grenades)",
                        player_id,
                        players.len(),
                        bullets.len(),
                        grenades.len()
                    );
                    for player in players.values() {
                        println!(
                            "  Player {}: pos=({:.1}, {:.1}, {:.1}), health={}",
                            player.id, player.x, player.y, player.z, player.health
                        );
                    }
                    target = players.keys().find(|id| **id != player_id).copied();
                    my_id = Some(player_id);
                    break;
                }
                ServerEvent::Error { message } => {
                    println!("Server rejected connection: {}", message);
                    return Ok(());
                }
                other => println!("Before init: {:?}", other),
            }
        }
    }

    let Some(my_id) = my_id else {
        println!("Connection closed before init arrived");
        return Ok(());
    };

    // Walk a small circle
    for i in 0..8 {
        let angle = i as f32 / 8.0 * std::f32::consts::TAU;
        let event = ClientEvent::Move {
            x: angle.cos() * 3.0,
            y: 1.7,
            z: angle.sin() * 3.0,
            rotation: angle,
        };
        println!("Sending move: {:?}", event);
        sink.send(encode(&event)?).await?;
        sleep(Duration::from_millis(100)).await;
    }

    // Fire one pistol shot and pick up the bullet the server registers
    let shot = ClientEvent::Shoot {
        origin: Vec3::new(3.0, 1.7, 0.0),
        direction: Vec3::new(0.0, 0.0, 1.0),
        speed: 40.0,
        damage: 15,
        weapon_type: "pistol".to_string(),
    };
    println!("Sending shot");
    sink.send(encode(&shot)?).await?;

    let mut my_bullet = None;
    while let Ok(Some(frame)) = timeout(Duration::from_secs(2), source.next()).await {
        if let Message::Text(text) = frame? {
            match serde_json::from_str::<ServerEvent>(&text)? {
                ServerEvent::BulletCreated { bullet_id, bullet } if bullet.owner_id == my_id => {
                    println!("Server registered bullet {}", bullet_id);
                    my_bullet = Some(bullet_id);
                    break;
                }
                other => println!("Event: {:?}", other),
            }
        }
    }

    // Report a hit if there is someone to hit
    match (target, my_bullet) {
        (Some(target), Some(bullet_id)) => {
            let hit = ClientEvent::Hit {
                player_id: target,
                bullet_id,
                damage: 15,
            };
            println!("Reporting hit on player {}", target);
            sink.send(encode(&hit)?).await?;
        }
        _ => println!("No other player connected, skipping hit report"),
    }

    // Listen for a few seconds to see what the server broadcasts
    println!("Listening for events...");
    loop {
        match timeout(Duration::from_secs(3), source.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ServerEvent>(&text) {
                Ok(ServerEvent::PlayerDied { player_id, killer_id }) if player_id == my_id => {
                    println!("We died (killer: {:?}), respawning", killer_id);
                    sink.send(encode(&ClientEvent::Respawn)?).await?;
                }
                Ok(event) => println!("Event: {:?}", event),
                Err(e) => println!("Failed to decode event: {}", e),
            },
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(e))) => {
                println!("Connection error: {}", e);
                break;
            }
            Ok(None) => {
                println!("Server closed the connection");
                break;
            }
            Err(_) => {
                // No events for a while, wrap up.
                break;
            }
        }
    }

    println!("Sending close");
    sink.send(Message::Close(None)).await?;
    println!("Test client finished");

    Ok(())
}
