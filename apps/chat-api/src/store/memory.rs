//! In-memory `ChatStore` implementation.
//!
//! All state lives behind a single `parking_lot::Mutex`, held only for
//! the duration of a map operation — never across an await point.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use chat_common::id::{prefix, prefixed_ulid};
use chat_common::SnowflakeGenerator;

use crate::error::ChatError;
use crate::models::message::{Message, MessageAuthor};
use crate::models::room::RoomSummary;
use crate::models::user::{UnseenEntry, UserSummary};
use crate::store::{ChatStore, NewUser, UserRecord};

struct StoredUser {
    record: UserRecord,
    avatar: String,
    online: bool,
    join_date: DateTime<Utc>,
    /// Sender user ID → count of unviewed direct messages.
    unseen: HashMap<String, u32>,
}

struct StoredRoom {
    summary: RoomSummary,
    /// Message IDs in insertion order.
    messages: Vec<i64>,
}

struct StoredMessage {
    id: i64,
    text: String,
    room_id: Option<String>,
    to: Option<String>,
    author_id: String,
    created_date: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    /// User ID → user.
    users: HashMap<String, StoredUser>,
    /// Username → user ID.
    usernames: HashMap<String, String>,
    /// Room ID → room.
    rooms: HashMap<String, StoredRoom>,
    /// Room name → room ID.
    room_names: HashMap<String, String>,
    /// Message ID → message. Snowflake IDs sort by creation time.
    messages: HashMap<i64, StoredMessage>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    snowflake: Arc<SnowflakeGenerator>,
}

impl MemoryStore {
    pub fn new(snowflake: Arc<SnowflakeGenerator>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            snowflake,
        }
    }
}

impl Inner {
    fn author(&self, user_id: &str) -> Result<MessageAuthor, ChatError> {
        let user = self
            .users
            .get(user_id)
            .ok_or_else(|| ChatError::Persistence(format!("unknown user {user_id}")))?;
        Ok(MessageAuthor {
            id: user.record.id.clone(),
            username: user.record.username.clone(),
        })
    }

    fn resolve_message(&self, id: i64) -> Result<Message, ChatError> {
        let stored = self
            .messages
            .get(&id)
            .ok_or_else(|| ChatError::Persistence(format!("unknown message {id}")))?;
        Ok(Message {
            id: stored.id,
            message: stored.text.clone(),
            room: stored.room_id.clone(),
            to: stored.to.clone(),
            created_by: self.author(&stored.author_id)?,
            created_date: stored.created_date,
        })
    }
}

/// Identicon URL derived from the username hash.
fn avatar_url(username: &str) -> String {
    let digest = Sha256::digest(username.as_bytes());
    let hex: String = digest.iter().take(16).map(|b| format!("{b:02x}")).collect();
    format!("https://gravatar.com/avatar/{hex}?d=identicon")
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, ChatError> {
        let inner = self.inner.lock();
        Ok(inner
            .usernames
            .get(username)
            .and_then(|id| inner.users.get(id))
            .map(|u| u.record.clone()))
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, ChatError> {
        let mut inner = self.inner.lock();
        if inner.usernames.contains_key(&user.username) {
            return Err(ChatError::UsernameTaken);
        }

        let record = UserRecord {
            id: prefixed_ulid(prefix::USER),
            username: user.username.clone(),
            email: user.email,
            password_digest: user.password_digest,
        };
        inner.usernames.insert(user.username.clone(), record.id.clone());
        inner.users.insert(
            record.id.clone(),
            StoredUser {
                record: record.clone(),
                avatar: avatar_url(&user.username),
                online: true,
                join_date: Utc::now(),
                unseen: HashMap::new(),
            },
        );
        Ok(record)
    }

    async fn set_user_online(&self, username: &str, online: bool) -> Result<(), ChatError> {
        let mut inner = self.inner.lock();
        let id = match inner.usernames.get(username) {
            Some(id) => id.clone(),
            None => {
                return Err(ChatError::Persistence(format!("unknown user {username}")))
            }
        };
        if let Some(user) = inner.users.get_mut(&id) {
            user.online = online;
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, ChatError> {
        let inner = self.inner.lock();
        let mut users: Vec<UserSummary> = inner
            .users
            .values()
            .map(|u| UserSummary {
                id: u.record.id.clone(),
                username: u.record.username.clone(),
                avatar: u.avatar.clone(),
                online: u.online,
                join_date: u.join_date,
                unseen_messages: {
                    let mut entries: Vec<UnseenEntry> = u
                        .unseen
                        .iter()
                        .map(|(from, count)| UnseenEntry {
                            from: from.clone(),
                            count: *count,
                        })
                        .collect();
                    entries.sort_by(|a, b| a.from.cmp(&b.from));
                    entries
                },
            })
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn create_room(&self, name: &str, creator_id: &str) -> Result<RoomSummary, ChatError> {
        let mut inner = self.inner.lock();
        if inner.room_names.contains_key(name) {
            return Err(ChatError::DuplicateRoom(name.to_string()));
        }

        let summary = RoomSummary {
            id: prefixed_ulid(prefix::ROOM),
            name: name.to_string(),
            created_by: creator_id.to_string(),
            created_date: Utc::now(),
        };
        inner.room_names.insert(name.to_string(), summary.id.clone());
        inner.rooms.insert(
            summary.id.clone(),
            StoredRoom {
                summary: summary.clone(),
                messages: Vec::new(),
            },
        );
        Ok(summary)
    }

    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, ChatError> {
        let inner = self.inner.lock();
        let mut rooms: Vec<RoomSummary> =
            inner.rooms.values().map(|r| r.summary.clone()).collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn room_history(&self, room_id: &str) -> Result<Vec<Message>, ChatError> {
        let inner = self.inner.lock();
        let room = inner
            .rooms
            .get(room_id)
            .ok_or_else(|| ChatError::Persistence(format!("unknown room {room_id}")))?;
        room.messages
            .iter()
            .map(|id| inner.resolve_message(*id))
            .collect()
    }

    async fn create_room_message(
        &self,
        room_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<Message, ChatError> {
        let id = self.snowflake.generate();
        let mut inner = self.inner.lock();
        if !inner.rooms.contains_key(room_id) {
            return Err(ChatError::Persistence(format!("unknown room {room_id}")));
        }
        // Author must resolve before the message is linked anywhere; a
        // failed write must not leave the room history unreadable.
        inner.author(author_id)?;

        inner.messages.insert(
            id,
            StoredMessage {
                id,
                text: text.to_string(),
                room_id: Some(room_id.to_string()),
                to: None,
                author_id: author_id.to_string(),
                created_date: Utc::now(),
            },
        );
        if let Some(room) = inner.rooms.get_mut(room_id) {
            room.messages.push(id);
        }
        inner.resolve_message(id)
    }

    async fn create_direct_message(
        &self,
        author_id: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<Message, ChatError> {
        let id = self.snowflake.generate();
        let mut inner = self.inner.lock();
        inner.author(author_id)?;

        inner.messages.insert(
            id,
            StoredMessage {
                id,
                text: text.to_string(),
                room_id: None,
                to: Some(recipient_id.to_string()),
                author_id: author_id.to_string(),
                created_date: Utc::now(),
            },
        );
        inner.resolve_message(id)
    }

    async fn direct_history(
        &self,
        user_id: &str,
        peer_id: &str,
    ) -> Result<Vec<Message>, ChatError> {
        let inner = self.inner.lock();
        let mut ids: Vec<i64> = inner
            .messages
            .values()
            .filter(|m| {
                let from_peer = m.author_id == peer_id && m.to.as_deref() == Some(user_id);
                let to_peer = m.author_id == user_id && m.to.as_deref() == Some(peer_id);
                from_peer || to_peer
            })
            .map(|m| m.id)
            .collect();
        // Snowflakes are time-ordered.
        ids.sort_unstable();
        ids.into_iter().map(|id| inner.resolve_message(id)).collect()
    }

    async fn increment_unseen(
        &self,
        recipient_id: &str,
        sender_id: &str,
    ) -> Result<u32, ChatError> {
        let mut inner = self.inner.lock();
        let user = inner.users.get_mut(recipient_id).ok_or_else(|| {
            ChatError::Persistence(format!("unknown user {recipient_id}"))
        })?;
        let count = user.unseen.entry(sender_id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn reset_unseen(&self, recipient_id: &str, sender_id: &str) -> Result<(), ChatError> {
        let mut inner = self.inner.lock();
        let user = inner.users.get_mut(recipient_id).ok_or_else(|| {
            ChatError::Persistence(format!("unknown user {recipient_id}"))
        })?;
        if let Some(count) = user.unseen.get_mut(sender_id) {
            *count = 0;
        }
        Ok(())
    }
}
