//! Wire-format intents and events.
//!
//! Clients send `{"action": <name>, "body": {...}, "frontEndId"?: v}`;
//! the server replies with `{"action": <name>, "response": ...}` events,
//! or `{"action": "error", "error": <string>}` on a failed intent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Action names
// ---------------------------------------------------------------------------

/// Outbound action names.
pub struct Action;

impl Action {
    pub const MESSAGE: &'static str = "message";
    pub const PRIVATE_MESSAGE: &'static str = "private_message";
    pub const TYPING: &'static str = "typing";
    pub const STOP_TYPING: &'static str = "stop_typing";
    pub const ADD_ROOM: &'static str = "add_room";
    pub const SUBSCRIBE_ROOM: &'static str = "subscribe_room";
    pub const SUBSCRIBE_USER: &'static str = "subscribe_user";
    pub const LOGIN: &'static str = "login";
    pub const USER_JOINED: &'static str = "user_joined";
    pub const USER_LEFT: &'static str = "user_left";
    pub const UNSEEN_MESSAGE: &'static str = "unseen_message";
    pub const ERROR: &'static str = "error";
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// A decoded client query: the intent plus an optional correlation
/// value echoed back on the response.
#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    #[serde(flatten)]
    pub intent: Intent,
    #[serde(rename = "frontEndId", default)]
    pub front_end_id: Option<Value>,
}

/// The closed set of inbound intents. An unrecognized action fails to
/// decode and is dropped by the connection loop before routing.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", content = "body", rename_all = "snake_case")]
pub enum Intent {
    Message(RoomMessageBody),
    PrivateMessage(DirectMessageBody),
    Typing(TypingBody),
    StopTyping(TypingBody),
    AddRoom(AddRoomBody),
    SubscribeRoom(SubscribeRoomBody),
    SubscribeUser(SubscribeUserBody),
    LeaveRoom(LeaveRoomBody),
    Login(LoginBody),
    LoginWithToken(TokenLoginBody),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessageBody {
    pub message: String,
    pub user_id: String,
    pub room_id: String,
    pub room_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessageBody {
    pub message: String,
    /// Sender user ID.
    pub user_id: String,
    /// Recipient user ID.
    pub direct_user_id: String,
    /// Recipient username, for the live-delivery lookup.
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingBody {
    /// Room form: the room being typed in.
    #[serde(default)]
    pub room_name: Option<String>,
    /// Direct form: the peer's username.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_direct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRoomBody {
    pub name: String,
    /// Creator user ID.
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRoomBody {
    /// Room ID.
    pub id: String,
    pub room_name: String,
    pub current_user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeUserBody {
    /// Peer user ID.
    pub id: String,
    pub current_user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomBody {
    pub room_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub username: String,
    pub password: String,
    /// True for signin, false for signup.
    #[serde(default)]
    pub is_signin: bool,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLoginBody {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// An event sent from the server to a client.
#[derive(Debug, Clone, Serialize)]
pub struct ServerEvent {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "frontEndId", skip_serializing_if = "Option::is_none")]
    pub front_end_id: Option<Value>,
}

impl ServerEvent {
    pub fn new(action: &str, response: Value) -> Self {
        Self {
            action: action.to_string(),
            response: Some(response),
            error: None,
            front_end_id: None,
        }
    }

    /// Build an error event for the originating connection.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            action: Action::ERROR.to_string(),
            response: None,
            error: Some(message.into()),
            front_end_id: None,
        }
    }

    pub fn with_front_end_id(mut self, front_end_id: Option<Value>) -> Self {
        self.front_end_id = front_end_id;
        self
    }
}
