use chrono::{DateTime, Utc};
use serde::Serialize;

/// A user as sent to clients. Never carries the password digest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub online: bool,
    pub join_date: DateTime<Utc>,
    pub unseen_messages: Vec<UnseenEntry>,
}

/// Count of direct messages from one sender that the user has not yet
/// viewed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnseenEntry {
    /// Sender user ID.
    pub from: String,
    pub count: u32,
}
