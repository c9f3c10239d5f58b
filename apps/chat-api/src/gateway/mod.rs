//! The connection session and message-routing layer.

pub mod events;
pub mod fanout;
pub mod presence;
pub mod registry;
pub mod router;
pub mod server;
pub mod subscriptions;

use tokio::sync::mpsc;

use events::ServerEvent;

/// Handle used to queue events for a single connection's writer.
pub type ConnectionSender = mpsc::UnboundedSender<ServerEvent>;
