//! Persistence collaborator contract for the routing core.

pub mod memory;

use async_trait::async_trait;

use crate::error::ChatError;
use crate::models::message::Message;
use crate::models::room::RoomSummary;
use crate::models::user::UserSummary;

/// A user row as the credential service sees it. Includes the password
/// digest; never leaves the server.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_digest: String,
}

/// Data for a new account.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_digest: String,
}

/// Abstraction over message/room/user storage.
///
/// The routing core only talks to storage through this trait; the
/// shipped implementation is the in-memory [`memory::MemoryStore`].
#[async_trait]
pub trait ChatStore: Send + Sync {
    // Users.
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, ChatError>;
    /// Create an account. The new user starts out online.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, ChatError>;
    async fn set_user_online(&self, username: &str, online: bool) -> Result<(), ChatError>;
    async fn list_users(&self) -> Result<Vec<UserSummary>, ChatError>;

    // Rooms.
    async fn create_room(&self, name: &str, creator_id: &str) -> Result<RoomSummary, ChatError>;
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, ChatError>;
    /// Messages sent to the room, oldest first.
    async fn room_history(&self, room_id: &str) -> Result<Vec<Message>, ChatError>;

    // Messages.
    async fn create_room_message(
        &self,
        room_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<Message, ChatError>;
    async fn create_direct_message(
        &self,
        author_id: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<Message, ChatError>;
    /// Direct messages exchanged between the two users, oldest first.
    async fn direct_history(
        &self,
        user_id: &str,
        peer_id: &str,
    ) -> Result<Vec<Message>, ChatError>;

    // Unseen counters.
    /// Bump the recipient's unseen count for this sender and return the
    /// new value.
    async fn increment_unseen(
        &self,
        recipient_id: &str,
        sender_id: &str,
    ) -> Result<u32, ChatError>;
    async fn reset_unseen(&self, recipient_id: &str, sender_id: &str) -> Result<(), ChatError>;
}
