//! WebSocket upgrade handler and per-connection event loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use crate::AppState;

use super::events::{ClientQuery, ServerEvent};
use super::fanout::{BroadcastPayload, Scope};
use super::presence;
use super::router::{self, ConnectionContext};

pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// One task per connection. Reads client queries, routes them, and
/// multiplexes unicast and broadcast deliveries back onto the socket.
///
/// A handler awaiting a slow collaborator delays only this connection;
/// every other connection's task keeps running.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut ctx = ConnectionContext::new(tx);
    let mut broadcast_rx = state.broadcast.subscribe();

    tracing::debug!(conn_id = %ctx.conn_id, "connection opened");

    loop {
        tokio::select! {
            // Client sends us a query.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let query: ClientQuery = match serde_json::from_str(&text) {
                            Ok(query) => query,
                            Err(err) => {
                                // Unknown action or malformed body.
                                // Best effort: drop it.
                                tracing::debug!(
                                    conn_id = %ctx.conn_id,
                                    %err,
                                    "undecodable query"
                                );
                                continue;
                            }
                        };
                        router::handle_intent(&state, &mut ctx, query).await;
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(conn_id = %ctx.conn_id, %err, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            // Unicast event queued for this connection.
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        let json = serde_json::to_string(&event).unwrap();
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Fan-out from the broadcast hub.
            result = broadcast_rx.recv() => {
                match result {
                    Ok(payload) => {
                        if !should_deliver(&ctx, &payload) {
                            continue;
                        }
                        let json = serde_json::to_string(&payload.event).unwrap();
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            conn_id = %ctx.conn_id,
                            skipped = n,
                            "connection lagged behind broadcast"
                        );
                        // Continue — we just drop the missed events.
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // The disconnect path must release the session binding even if the
    // connection had unresolved intents; a stale release is a no-op.
    presence::handle_disconnect(&state, &ctx.conn_id).await;

    tracing::debug!(conn_id = %ctx.conn_id, "connection closed");
}

/// Local filter applied by each connection task to hub payloads.
fn should_deliver(ctx: &ConnectionContext, payload: &BroadcastPayload) -> bool {
    if payload.exclude_conn.as_deref() == Some(ctx.conn_id.as_str()) {
        return false;
    }
    match &payload.scope {
        Scope::Global => true,
        Scope::Room(name) => ctx.joined_rooms.contains(name),
    }
}
