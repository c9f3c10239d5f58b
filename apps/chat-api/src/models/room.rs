use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named broadcast group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    /// Creator user ID.
    pub created_by: String,
    pub created_date: DateTime<Utc>,
}
