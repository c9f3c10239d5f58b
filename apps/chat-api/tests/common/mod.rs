use std::sync::Arc;

use chat_api::auth::jwt::JwtCredentials;
use chat_api::config::Config;
use chat_api::gateway::fanout::GatewayBroadcast;
use chat_api::gateway::registry::SessionRegistry;
use chat_api::gateway::subscriptions::SubscriptionTracker;
use chat_api::store::memory::MemoryStore;
use chat_api::store::ChatStore;
use chat_api::AppState;
use chat_common::SnowflakeGenerator;

pub fn test_config() -> Config {
    Config {
        token_secret: "test-secret".to_string(),
        token_ttl_hours: 1,
        port: 0,
        chat_origin: None,
    }
}

/// Build an AppState over a fresh in-memory store.
pub fn test_state() -> AppState {
    let config = test_config();
    let snowflake = Arc::new(SnowflakeGenerator::new(0));
    let store: Arc<dyn ChatStore> = Arc::new(MemoryStore::new(snowflake));
    let credentials = Arc::new(JwtCredentials::new(
        store.clone(),
        &config.token_secret,
        config.token_ttl_hours,
    ));

    AppState {
        store,
        credentials,
        config: Arc::new(config),
        broadcast: Arc::new(GatewayBroadcast::new()),
        sessions: Arc::new(SessionRegistry::new()),
        subscriptions: Arc::new(SubscriptionTracker::new()),
    }
}
