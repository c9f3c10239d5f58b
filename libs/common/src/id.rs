use ulid::Ulid;

/// Mint a prefixed ULID, e.g. `usr_01J8...`.
///
/// # Examples
/// ```
/// let id = chat_common::id::prefixed_ulid(chat_common::id::prefix::USER);
/// assert!(id.starts_with("usr_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const USER: &str = "usr";
    pub const ROOM: &str = "room";
    pub const CONNECTION: &str = "conn";
}
