use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted message with its author resolved for the wire.
///
/// Exactly one of `room` / `to` is set: `room` for room broadcasts,
/// `to` for direct messages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub created_by: MessageAuthor,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageAuthor {
    pub id: String,
    pub username: String,
}
