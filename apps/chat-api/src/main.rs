use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_api::auth::jwt::JwtCredentials;
use chat_api::config::Config;
use chat_api::gateway::fanout::GatewayBroadcast;
use chat_api::gateway::registry::SessionRegistry;
use chat_api::gateway::subscriptions::SubscriptionTracker;
use chat_api::store::memory::MemoryStore;
use chat_api::store::ChatStore;
use chat_api::AppState;
use chat_common::SnowflakeGenerator;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let snowflake = Arc::new(SnowflakeGenerator::new(0));
    let store: Arc<dyn ChatStore> = Arc::new(MemoryStore::new(snowflake));
    let credentials = Arc::new(JwtCredentials::new(
        store.clone(),
        &config.token_secret,
        config.token_ttl_hours,
    ));

    let state = AppState {
        store,
        credentials,
        config: Arc::new(config),
        broadcast: Arc::new(GatewayBroadcast::new()),
        sessions: Arc::new(SessionRegistry::new()),
        subscriptions: Arc::new(SubscriptionTracker::new()),
    };

    let cors = match &state.config.chat_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>().expect("invalid CHAT_ORIGIN"))
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = axum::Router::new()
        .merge(chat_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "chat-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
