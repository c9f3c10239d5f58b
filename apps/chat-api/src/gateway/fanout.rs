//! Broadcast hub for fanning events out to connected sessions.
//!
//! Uses a single `tokio::sync::broadcast` channel. Each connection task
//! subscribes and filters events locally by scope (room membership,
//! originator exclusion). This is efficient for the single-process
//! architecture.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::events::ServerEvent;

/// Capacity of the broadcast channel. Slow receivers that fall behind
/// will skip messages (RecvError::Lagged).
const BROADCAST_CAPACITY: usize = 4096;

/// Where a broadcast event should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every connected client.
    Global,
    /// Only connections currently joined to the named room.
    Room(String),
}

/// A payload fanned out to the connection tasks.
#[derive(Debug, Clone)]
pub struct BroadcastPayload {
    pub scope: Scope,
    /// Connection to skip (the originator), if any.
    pub exclude_conn: Option<String>,
    pub event: ServerEvent,
}

/// The global broadcast hub. Cloneable — store in AppState.
#[derive(Clone)]
pub struct GatewayBroadcast {
    sender: broadcast::Sender<Arc<BroadcastPayload>>,
}

impl GatewayBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the broadcast channel. Each connection task calls
    /// this once to get its own receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BroadcastPayload>> {
        self.sender.subscribe()
    }

    /// Dispatch an event to all connected sessions.
    pub fn dispatch(&self, payload: BroadcastPayload) {
        // send() returns Err if there are no receivers — that's fine.
        let _ = self.sender.send(Arc::new(payload));
    }
}

impl Default for GatewayBroadcast {
    fn default() -> Self {
        Self::new()
    }
}
