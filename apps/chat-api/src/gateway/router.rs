//! Inbound intent dispatch.
//!
//! One handler per intent; the match is exhaustive over the closed
//! `Intent` enum. Policy is best effort: structurally invalid bodies
//! are ignored, and every collaborator failure is reported to the
//! originating connection as an `error` event before being re-raised
//! so the handler aborts (a failed login leaves no partial state).

use std::collections::HashSet;

use serde_json::{json, Value};

use chat_common::id::{prefix, prefixed_ulid};

use crate::error::ChatError;
use crate::AppState;

use super::events::{
    Action, AddRoomBody, ClientQuery, DirectMessageBody, Intent, LeaveRoomBody, LoginBody,
    RoomMessageBody, ServerEvent, SubscribeRoomBody, SubscribeUserBody, TokenLoginBody,
    TypingBody,
};
use super::fanout::{BroadcastPayload, Scope};
use super::presence;
use super::registry::SessionHandle;
use super::subscriptions::ViewTarget;
use super::ConnectionSender;

/// Per-connection state owned by the connection task.
pub struct ConnectionContext {
    /// Unique id for this connection (`conn_` prefixed ULID).
    pub conn_id: String,
    /// Sender feeding this connection's writer.
    pub tx: ConnectionSender,
    /// Set once a login completes.
    pub user: Option<SessionUser>,
    /// Rooms this connection has joined for broadcast fan-out.
    pub joined_rooms: HashSet<String>,
}

/// The authenticated user bound to a connection.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
}

impl ConnectionContext {
    pub fn new(tx: ConnectionSender) -> Self {
        Self {
            conn_id: prefixed_ulid(prefix::CONNECTION),
            tx,
            user: None,
            joined_rooms: HashSet::new(),
        }
    }

    fn send(&self, event: ServerEvent) {
        // The writer half may already be gone; a dropped event on a
        // dead connection is fine.
        let _ = self.tx.send(event);
    }

    /// Surface a collaborator failure to this connection only, then
    /// re-raise it so the handler aborts.
    fn report<T>(&self, result: Result<T, ChatError>) -> Result<T, ChatError> {
        if let Err(err) = &result {
            self.send(ServerEvent::error(err.to_string()));
        }
        result
    }
}

/// Route one decoded intent to its handler.
pub async fn handle_intent(state: &AppState, ctx: &mut ConnectionContext, query: ClientQuery) {
    let front_end_id = query.front_end_id;
    let result = match query.intent {
        Intent::Message(body) => room_message(state, ctx, body).await,
        Intent::PrivateMessage(body) => direct_message(state, ctx, body).await,
        Intent::Typing(body) => typing(state, ctx, Action::TYPING, body),
        Intent::StopTyping(body) => typing(state, ctx, Action::STOP_TYPING, body),
        Intent::AddRoom(body) => add_room(state, ctx, body, front_end_id).await,
        Intent::SubscribeRoom(body) => subscribe_room(state, ctx, body).await,
        Intent::SubscribeUser(body) => subscribe_user(state, ctx, body).await,
        Intent::LeaveRoom(body) => leave_room(ctx, body),
        Intent::Login(body) => login(state, ctx, body, front_end_id).await,
        Intent::LoginWithToken(body) => login_with_token(state, ctx, body, front_end_id).await,
    };

    if let Err(err) = result {
        // The error event has already been sent to the originator.
        tracing::debug!(conn_id = %ctx.conn_id, %err, "intent aborted");
    }
}

/// Persist a room message, then fan it out to every connection joined
/// to the room. The sender is joined too, so it receives the echo.
async fn room_message(
    state: &AppState,
    ctx: &ConnectionContext,
    body: RoomMessageBody,
) -> Result<(), ChatError> {
    let message = ctx.report(
        state
            .store
            .create_room_message(&body.room_id, &body.user_id, &body.message)
            .await,
    )?;

    state.broadcast.dispatch(BroadcastPayload {
        scope: Scope::Room(body.room_name),
        exclude_conn: None,
        event: ServerEvent::new(Action::MESSAGE, serde_json::to_value(&message).unwrap()),
    });
    Ok(())
}

/// Persist a direct message and deliver it to the recipient only.
///
/// A recipient currently viewing this conversation gets the raw
/// message; otherwise their unseen counter is bumped and they get an
/// unseen update instead. An offline recipient gets neither — the
/// counter persists for their next login.
async fn direct_message(
    state: &AppState,
    ctx: &ConnectionContext,
    body: DirectMessageBody,
) -> Result<(), ChatError> {
    let message = ctx.report(
        state
            .store
            .create_direct_message(&body.user_id, &body.direct_user_id, &body.message)
            .await,
    )?;

    let recipient = body.username.to_lowercase();
    let viewing = state
        .subscriptions
        .is_viewing(&body.direct_user_id, &ViewTarget::User(body.user_id.clone()));

    if viewing {
        match state.sessions.lookup(&recipient) {
            Some(handle) => {
                let event = ServerEvent::new(
                    Action::PRIVATE_MESSAGE,
                    serde_json::to_value(&message).unwrap(),
                );
                let _ = handle.sender.send(event);
            }
            None => {
                tracing::debug!(username = %recipient, "recipient offline, dropping direct message");
            }
        }
    } else {
        let count = ctx.report(
            state
                .store
                .increment_unseen(&body.direct_user_id, &body.user_id)
                .await,
        )?;
        presence::push_unseen(state, &recipient, &body.user_id, count);
    }
    Ok(())
}

/// Typing indicators carry no persistence; fan-out mirrors the message
/// shape. Ignored before login.
fn typing(
    state: &AppState,
    ctx: &ConnectionContext,
    action: &str,
    body: TypingBody,
) -> Result<(), ChatError> {
    let Some(user) = &ctx.user else {
        return Ok(());
    };

    if body.is_direct {
        let Some(peer) = body.username else {
            return Ok(());
        };
        let peer = peer.to_lowercase();
        match state.sessions.lookup(&peer) {
            Some(handle) => {
                let event = ServerEvent::new(
                    action,
                    json!({ "username": user.username, "direct": true }),
                );
                let _ = handle.sender.send(event);
            }
            None => {
                tracing::debug!(username = %peer, "typing peer offline");
            }
        }
    } else {
        let Some(room_name) = body.room_name else {
            return Ok(());
        };
        state.broadcast.dispatch(BroadcastPayload {
            scope: Scope::Room(room_name.clone()),
            exclude_conn: Some(ctx.conn_id.clone()),
            event: ServerEvent::new(
                action,
                json!({ "username": user.username, "roomName": room_name }),
            ),
        });
    }
    Ok(())
}

/// Create a room and announce it to every connection — the room list
/// affects every client's UI, so this is global, not room-scoped.
async fn add_room(
    state: &AppState,
    ctx: &ConnectionContext,
    body: AddRoomBody,
    front_end_id: Option<Value>,
) -> Result<(), ChatError> {
    let room = ctx.report(state.store.create_room(&body.name, &body.user_id).await)?;

    state.broadcast.dispatch(BroadcastPayload {
        scope: Scope::Global,
        exclude_conn: None,
        event: ServerEvent::new(Action::ADD_ROOM, serde_json::to_value(&room).unwrap())
            .with_front_end_id(front_end_id),
    });
    Ok(())
}

/// Point the user's view at the room, join its broadcast group, and
/// return the room history to the requesting connection only.
async fn subscribe_room(
    state: &AppState,
    ctx: &mut ConnectionContext,
    body: SubscribeRoomBody,
) -> Result<(), ChatError> {
    let history = ctx.report(state.store.room_history(&body.id).await)?;

    state
        .subscriptions
        .set(&body.current_user_id, Some(ViewTarget::Room(body.id)));
    ctx.joined_rooms.insert(body.room_name);

    ctx.send(ServerEvent::new(
        Action::SUBSCRIBE_ROOM,
        serde_json::to_value(&history).unwrap(),
    ));
    Ok(())
}

/// Point the user's view at the peer, clear the unseen counter for
/// that conversation, and return the direct history.
async fn subscribe_user(
    state: &AppState,
    ctx: &ConnectionContext,
    body: SubscribeUserBody,
) -> Result<(), ChatError> {
    let history = ctx.report(
        state
            .store
            .direct_history(&body.current_user_id, &body.id)
            .await,
    )?;

    state
        .subscriptions
        .set(&body.current_user_id, Some(ViewTarget::User(body.id.clone())));
    ctx.report(
        state
            .store
            .reset_unseen(&body.current_user_id, &body.id)
            .await,
    )?;

    ctx.send(ServerEvent::new(
        Action::SUBSCRIBE_USER,
        serde_json::to_value(&history).unwrap(),
    ));
    Ok(())
}

fn leave_room(ctx: &mut ConnectionContext, body: LeaveRoomBody) -> Result<(), ChatError> {
    ctx.joined_rooms.remove(&body.room_name);
    Ok(())
}

/// Password login (signin or signup). A repeated login on a connection
/// that is already bound is a no-op.
async fn login(
    state: &AppState,
    ctx: &mut ConnectionContext,
    body: LoginBody,
    front_end_id: Option<Value>,
) -> Result<(), ChatError> {
    if ctx.user.is_some() {
        return Ok(());
    }

    let username = body.username.to_lowercase();
    let token = if body.is_signin {
        ctx.report(state.credentials.signin(&username, &body.password).await)?
    } else {
        let email = body.email.unwrap_or_default();
        ctx.report(
            state
                .credentials
                .signup(&username, &body.password, &email)
                .await,
        )?
    };

    finish_login(state, ctx, &username, token, front_end_id).await
}

/// Reconnect with a previously issued token.
async fn login_with_token(
    state: &AppState,
    ctx: &mut ConnectionContext,
    body: TokenLoginBody,
    front_end_id: Option<Value>,
) -> Result<(), ChatError> {
    if ctx.user.is_some() {
        return Ok(());
    }

    let identity = ctx.report(state.credentials.verify_token(&body.token).await)?;
    ctx.report(state.store.set_user_online(&identity.username, true).await)?;

    finish_login(state, ctx, &identity.username, body.token, front_end_id).await
}

/// Shared tail of both login flows. The session is bound only after
/// every collaborator call has succeeded, so a failed login leaves no
/// partial state.
async fn finish_login(
    state: &AppState,
    ctx: &mut ConnectionContext,
    username: &str,
    token: String,
    front_end_id: Option<Value>,
) -> Result<(), ChatError> {
    let users = ctx.report(state.store.list_users().await)?;
    let rooms = ctx.report(state.store.list_rooms().await)?;

    let current_user = ctx.report(
        users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| ChatError::Persistence(format!("no user record for {username}"))),
    )?;

    // Clear any view target left over from a previous connection, then
    // bind. A binding held by a different connection is silently
    // overwritten: last login wins.
    state.subscriptions.set(&current_user.id, None);
    state.sessions.bind(
        username,
        SessionHandle {
            conn_id: ctx.conn_id.clone(),
            sender: ctx.tx.clone(),
        },
    );
    ctx.user = Some(SessionUser {
        id: current_user.id.clone(),
        username: username.to_string(),
    });

    tracing::info!(%username, conn_id = %ctx.conn_id, "user logged in");

    ctx.send(
        ServerEvent::new(
            Action::LOGIN,
            json!({
                "users": users,
                "rooms": rooms,
                "currentUser": current_user,
                "token": token,
            }),
        )
        .with_front_end_id(front_end_id),
    );

    presence::broadcast_user_joined(state, &ctx.conn_id, &users);
    Ok(())
}
