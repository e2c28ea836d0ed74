//! Server network layer handling WebSocket connections and the main event loop

use crate::broadcast::dispatch;
use crate::registry::SessionRegistry;
use crate::router::EventRouter;
use crate::world::World;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientEvent, PlayerId, ServerEvent};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    /// A socket finished its handshake and wants a player ID. The reply
    /// is None when the server is full.
    Connected {
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Message>,
        ready: oneshot::Sender<Option<PlayerId>>,
    },
    /// A decoded event from a registered client
    Inbound {
        player_id: PlayerId,
        event: ClientEvent,
    },
    /// Liveness signal from a client's control frames
    Heartbeat { player_id: PlayerId },
    /// The client's socket closed or errored
    Disconnected { player_id: PlayerId },
}

/// Server tuning knobs
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_clients: usize,
    /// Sessions silent for this long are evicted. None disables the sweep.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: 32,
            idle_timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// Main server owning the world and the connection registry
///
/// All mutation happens on the task running `run`; connection tasks only
/// decode frames and forward them through the channel, so the world
/// needs no locking and events from one client apply in arrival order.
pub struct GameServer {
    listener: TcpListener,
    registry: SessionRegistry,
    world: World,
    router: EventRouter,
    config: ServerConfig,

    // Communication channel from connection tasks
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl GameServer {
    pub async fn bind(addr: &str, config: ServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(GameServer {
            listener,
            registry: SessionRegistry::new(config.max_clients),
            world: World::new(),
            router: EventRouter::new(),
            config,
            server_tx,
            server_rx,
        })
    }

    /// The address the server actually bound, useful with port 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept task and the main event loop until the process
    /// is stopped.
    pub async fn run(self) -> std::io::Result<()> {
        let GameServer {
            listener,
            mut registry,
            mut world,
            mut router,
            config,
            server_tx,
            mut server_rx,
        } = self;

        let accept_tx = server_tx.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        debug!("Accepted TCP connection from {}", addr);
                        let connection_tx = accept_tx.clone();
                        tokio::spawn(handle_connection(stream, addr, connection_tx));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });

        let mut sweep_interval = interval(Duration::from_secs(1));
        info!("Server started successfully");

        loop {
            tokio::select! {
                message = server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Connected { addr, outbound, ready }) => {
                            if registry.is_full() {
                                warn!("Rejecting connection from {}: server full", addr);
                                let rejection = ServerEvent::Error {
                                    message: "server full".to_string(),
                                };
                                if let Ok(text) = serde_json::to_string(&rejection) {
                                    let _ = outbound.send(Message::Text(text));
                                }
                                let _ = ready.send(None);
                            } else if let Some(player_id) = registry.register(addr, outbound) {
                                let out = router.handle_connect(&mut world, player_id);
                                dispatch(&registry, &out);
                                let _ = ready.send(Some(player_id));
                            } else {
                                let _ = ready.send(None);
                            }
                        }
                        Some(ServerMessage::Inbound { player_id, event }) => {
                            registry.touch(player_id);
                            let out = router.route(&mut world, player_id, event, Instant::now());
                            dispatch(&registry, &out);
                        }
                        Some(ServerMessage::Heartbeat { player_id }) => {
                            registry.touch(player_id);
                        }
                        Some(ServerMessage::Disconnected { player_id }) => {
                            registry.unregister(player_id);
                            let out = router.handle_disconnect(&mut world, player_id);
                            dispatch(&registry, &out);
                        }
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = sweep_interval.tick() => {
                    if let Some(timeout) = config.idle_timeout {
                        for player_id in registry.sweep(timeout) {
                            warn!("Evicting idle player {}", player_id);
                            let out = router.handle_disconnect(&mut world, player_id);
                            dispatch(&registry, &out);
                        }
                    }
                },
            }
        }

        Ok(())
    }
}

/// Drives one client connection: handshake, registration, then forwarding
/// decoded frames to the main loop until the socket goes away.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {}: {}", addr, e);
            return;
        }
    };
    let (mut ws_sink, mut ws_source) = ws_stream.split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let (ready_tx, ready_rx) = oneshot::channel();

    if server_tx
        .send(ServerMessage::Connected {
            addr,
            outbound: outbound_tx.clone(),
            ready: ready_tx,
        })
        .is_err()
    {
        return;
    }

    // Writer task drains the session's queue into the socket. It exits
    // once every sender is gone and the queue is empty.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if ws_sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    let player_id = match ready_rx.await {
        Ok(Some(player_id)) => player_id,
        _ => {
            // Rejected. Any queued error frame still drains before the
            // writer closes the socket.
            drop(outbound_tx);
            let _ = writer.await;
            return;
        }
    };

    while let Some(frame) = ws_source.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if server_tx
                        .send(ServerMessage::Inbound { player_id, event })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Dropping malformed event from player {}: {}", player_id, e);
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
                let _ = server_tx.send(ServerMessage::Heartbeat { player_id });
            }
            Ok(Message::Pong(_)) => {
                let _ = server_tx.send(ServerMessage::Heartbeat { player_id });
            }
            Ok(Message::Close(_)) => {
                debug!("Player {} closed the connection", player_id);
                break;
            }
            Ok(_) => {
                // Binary frames are not part of the protocol.
            }
            Err(e) => {
                debug!("Connection error for player {}: {}", player_id, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::Disconnected { player_id });
    drop(outbound_tx);
    // The writer finishes after the main loop unregisters the session
    // and the last queued frames have been written out.
    let _ = writer.await;
}
