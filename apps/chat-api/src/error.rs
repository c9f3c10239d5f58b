use std::fmt;

/// Domain errors surfaced to the originating connection as `error`
/// events. Errors are never broadcast.
#[derive(Debug)]
pub enum ChatError {
    /// Bad username or password at signin.
    InvalidCredentials,
    /// Bad or expired bearer token.
    InvalidToken,
    /// Signup with a username that already exists.
    UsernameTaken,
    /// Room name collision on add_room.
    DuplicateRoom(String),
    /// Any storage failure. The detail stays server-side; clients get
    /// an opaque message.
    Persistence(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::InvalidCredentials => write!(f, "Invalid username or password"),
            ChatError::InvalidToken => {
                write!(f, "Your session has ended. Please sign in again.")
            }
            ChatError::UsernameTaken => write!(f, "User already exists"),
            ChatError::DuplicateRoom(name) => write!(f, "Room \"{name}\" already exists"),
            ChatError::Persistence(_) => write!(f, "An internal error occurred"),
        }
    }
}

impl std::error::Error for ChatError {}
