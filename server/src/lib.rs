//! # Game Server Library
//!
//! This library provides the authoritative server for a multiplayer arena
//! shooter. It owns the canonical copy of every player, bullet, and grenade,
//! applies the events clients report, and broadcasts the resulting facts so
//! that every connected client converges on the same world.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server holds the only copy of the world that matters. Clients render
//! and predict locally, but health, deaths, respawns, and entity lifetimes
//! are decided here and nowhere else.
//!
//! ### Event Synchronization
//! Clients do their own movement and collision work and report outcomes as
//! named events. The server validates each event against the current world,
//! applies it, and fans the resulting change out to everyone who needs it.
//! New clients receive one full snapshot and incremental events after that.
//!
//! ### Session Management
//! Handles the complete lifecycle of client connections including:
//! - WebSocket handshake and player ID assignment
//! - Per-connection decode and forwarding tasks
//! - Idle detection and eviction
//! - Disconnect cleanup and the resulting broadcasts
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! All world and registry mutation happens on one task. Connection tasks
//! decode frames and forward them through a channel, which serializes
//! events from all clients into a single stream and preserves per-client
//! ordering. Nothing in the game state needs a lock.
//!
//! ### WebSocket Transport
//! Each client holds one WebSocket connection carrying JSON-encoded named
//! events in both directions. Ordering and delivery come from the TCP
//! stream; the server never retransmits or sequences anything itself.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! The entity store: players, bullets, and grenades with their lifecycles,
//! health clamping, and snapshot support.
//!
//! ### Registry Module (`registry`)
//! Tracks live sessions, assigns player IDs, and holds the outbound queue
//! for each connection.
//!
//! ### Router Module (`router`)
//! The game rules. Validates incoming events, mutates the world, decides
//! who is told about it, and detects the end of a round.
//!
//! ### Broadcast Module (`broadcast`)
//! Delivery scopes and the fan-out of serialized events to sessions.
//!
//! ### Weapons Module (`weapons`)
//! Static weapon caps used to bound what client-reported shots and hits
//! may claim, plus explosion falloff.
//!
//! ### Network Module (`network`)
//! The WebSocket listener, per-connection tasks, and the main event loop
//! that ties the other modules together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{GameServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = GameServer::bind("127.0.0.1:8080", ServerConfig::default()).await?;
//!
//!     // Runs the accept task and the main event loop which:
//!     // - Registers new connections and sends them a world snapshot
//!     // - Validates and applies client events in arrival order
//!     // - Broadcasts resulting state changes to connected clients
//!     // - Evicts idle sessions and announces disconnects
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Trust Model
//!
//! Clients are trusted to report their own movement, shots, and hits; the
//! server does not re-simulate ballistics. What it does enforce: damage and
//! fire-rate caps from the weapon table, the health range, the dead/alive
//! state machine, and entity existence for every reference. Malformed or
//! stale events are dropped without a reply and can never crash the loop.

pub mod broadcast;
pub mod network;
pub mod registry;
pub mod router;
pub mod weapons;
pub mod world;
