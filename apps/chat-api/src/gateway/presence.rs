//! Presence transitions and unseen-counter pushes.
//!
//! Invoked as a side effect of login, disconnect, and direct-message
//! routing; nothing here is an intent handler in its own right.

use serde_json::json;

use crate::models::user::UserSummary;
use crate::AppState;

use super::events::{Action, ServerEvent};
use super::fanout::{BroadcastPayload, Scope};

/// Announce a fresh user list to every connection except the one that
/// just logged in (it already got the list in its login payload).
pub fn broadcast_user_joined(state: &AppState, exclude_conn: &str, users: &[UserSummary]) {
    state.broadcast.dispatch(BroadcastPayload {
        scope: Scope::Global,
        exclude_conn: Some(exclude_conn.to_string()),
        event: ServerEvent::new(Action::USER_JOINED, json!({ "users": users })),
    });
}

/// Push an unseen-count update to the recipient, if reachable. An
/// offline recipient is not an error — the stored counter is delivered
/// with the user list on their next login.
pub fn push_unseen(state: &AppState, recipient_username: &str, sender_id: &str, count: u32) {
    match state.sessions.lookup(recipient_username) {
        Some(handle) => {
            let event = ServerEvent::new(
                Action::UNSEEN_MESSAGE,
                json!({ "from": sender_id, "count": count }),
            );
            let _ = handle.sender.send(event);
        }
        None => {
            tracing::debug!(
                username = %recipient_username,
                "unseen update for offline user, delivering on next login"
            );
        }
    }
}

/// Disconnect path: release the session binding, mark the user offline,
/// and announce the departure.
///
/// Does nothing when the connection never completed a login, or when
/// the username has since been rebound to a different connection (the
/// session was stolen by a newer login — the user is still online
/// there).
pub async fn handle_disconnect(state: &AppState, conn_id: &str) {
    let Some(username) = state.sessions.unbind(conn_id) else {
        return;
    };

    if let Err(err) = state.store.set_user_online(&username, false).await {
        tracing::warn!(%username, %err, "failed to mark user offline");
    }

    match state.store.list_users().await {
        Ok(users) => {
            state.broadcast.dispatch(BroadcastPayload {
                scope: Scope::Global,
                exclude_conn: Some(conn_id.to_string()),
                event: ServerEvent::new(Action::USER_LEFT, json!({ "users": users })),
            });
        }
        Err(err) => {
            tracing::warn!(%username, %err, "failed to load users for departure broadcast");
        }
    }

    tracing::info!(%username, conn_id = %conn_id, "user went offline");
}
