pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use auth::Credentials;
use config::Config;
use gateway::fanout::GatewayBroadcast;
use gateway::registry::SessionRegistry;
use gateway::subscriptions::SubscriptionTracker;
use store::ChatStore;

/// Shared application state available to every connection task.
///
/// The session registry and subscription tracker are the process-wide
/// mutable state of the routing core; they are constructed once at
/// startup and torn down with the process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub credentials: Arc<dyn Credentials>,
    pub config: Arc<Config>,
    pub broadcast: Arc<GatewayBroadcast>,
    pub sessions: Arc<SessionRegistry>,
    pub subscriptions: Arc<SubscriptionTracker>,
}
