use crate::registry::SessionRegistry;
use log::warn;
use shared::{PlayerId, ServerEvent};
use tokio_tungstenite::tungstenite::Message;

/// Which connected clients an event is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Everyone except the originator, who already knows.
    AllExcept(PlayerId),
    One(PlayerId),
}

/// An event paired with its delivery scope, produced by the router and
/// consumed by `dispatch`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub scope: Scope,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn all(event: ServerEvent) -> Self {
        Self {
            scope: Scope::All,
            event,
        }
    }

    pub fn all_except(player_id: PlayerId, event: ServerEvent) -> Self {
        Self {
            scope: Scope::AllExcept(player_id),
            event,
        }
    }

    pub fn one(player_id: PlayerId, event: ServerEvent) -> Self {
        Self {
            scope: Scope::One(player_id),
            event,
        }
    }
}

/// Delivers a batch of events to their scoped recipients.
///
/// Each event is serialized once and the resulting text frame is cloned
/// per recipient. Sessions whose writer task has exited are skipped; the
/// main loop learns about those through the reader side going away, so
/// failed sends are not treated as errors here. Returns the number of
/// frames actually queued.
pub fn dispatch(registry: &SessionRegistry, outbound: &[Outbound]) -> usize {
    let mut delivered = 0;

    for item in outbound {
        let text = match serde_json::to_string(&item.event) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode outbound event: {}", e);
                continue;
            }
        };

        match item.scope {
            Scope::One(player_id) => {
                if registry.send_to(player_id, Message::Text(text)) {
                    delivered += 1;
                }
            }
            Scope::All => {
                for session in registry.sessions() {
                    if session.send(Message::Text(text.clone())) {
                        delivered += 1;
                    }
                }
            }
            Scope::AllExcept(skip) => {
                for session in registry.sessions() {
                    if session.player_id != skip && session.send(Message::Text(text.clone())) {
                        delivered += 1;
                    }
                }
            }
        }
    }

    delivered
}
