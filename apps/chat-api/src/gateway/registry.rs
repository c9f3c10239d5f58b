//! Session registry: the username → live connection map.

use dashmap::DashMap;

use super::ConnectionSender;

/// A live binding between a username and its connection.
#[derive(Clone)]
pub struct SessionHandle {
    pub conn_id: String,
    pub sender: ConnectionSender,
}

/// Process-wide map of who is online and reachable.
///
/// Indexed both ways (username → handle, connection id → username) so
/// unbinding on disconnect is O(1) instead of a scan over all entries.
/// `DashMap` keeps each mutation atomic with respect to concurrent
/// readers; no lock is held across an await.
pub struct SessionRegistry {
    by_username: DashMap<String, SessionHandle>,
    by_conn: DashMap<String, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            by_username: DashMap::new(),
            by_conn: DashMap::new(),
        }
    }

    /// Insert or overwrite the binding for a username.
    ///
    /// A second login for the same username replaces the previous
    /// binding without closing the old connection (last login wins).
    /// No notification side effects; presence broadcasts are the
    /// caller's responsibility.
    pub fn bind(&self, username: &str, handle: SessionHandle) {
        if let Some(prev) = self
            .by_username
            .insert(username.to_string(), handle.clone())
        {
            if prev.conn_id != handle.conn_id {
                self.by_conn.remove(&prev.conn_id);
            }
        }
        self.by_conn.insert(handle.conn_id, username.to_string());
    }

    /// Look up the live connection for a username. `None` means the
    /// user is not currently connected and a direct action addressed
    /// to them is dropped.
    pub fn lookup(&self, username: &str) -> Option<SessionHandle> {
        self.by_username.get(username).map(|e| e.value().clone())
    }

    /// Remove the binding owned by this connection, returning the
    /// username that was unbound.
    ///
    /// A no-op returning `None` when the connection never bound a
    /// session, or when the username has since been rebound to a
    /// different connection — a late unbind must not evict the new
    /// binding.
    pub fn unbind(&self, conn_id: &str) -> Option<String> {
        let (_, username) = self.by_conn.remove(conn_id)?;
        let removed = self
            .by_username
            .remove_if(&username, |_, handle| handle.conn_id == conn_id);
        removed.map(|_| username)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle(conn_id: &str) -> SessionHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        SessionHandle {
            conn_id: conn_id.to_string(),
            sender: tx,
        }
    }

    #[test]
    fn bind_then_lookup_returns_handle() {
        let registry = SessionRegistry::new();
        registry.bind("alice", handle("conn_1"));

        let found = registry.lookup("alice").unwrap();
        assert_eq!(found.conn_id, "conn_1");
    }

    #[test]
    fn lookup_unknown_returns_none() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup("nobody").is_none());
    }

    #[test]
    fn unbind_removes_the_binding() {
        let registry = SessionRegistry::new();
        registry.bind("alice", handle("conn_1"));

        assert_eq!(registry.unbind("conn_1").as_deref(), Some("alice"));
        assert!(registry.lookup("alice").is_none());
    }

    #[test]
    fn unbind_unknown_connection_is_a_noop() {
        let registry = SessionRegistry::new();
        registry.bind("alice", handle("conn_1"));

        assert!(registry.unbind("conn_2").is_none());
        assert!(registry.lookup("alice").is_some());
    }

    #[test]
    fn rebind_overwrites_previous_connection() {
        let registry = SessionRegistry::new();
        registry.bind("alice", handle("conn_1"));
        registry.bind("alice", handle("conn_2"));

        let found = registry.lookup("alice").unwrap();
        assert_eq!(found.conn_id, "conn_2");
    }

    #[test]
    fn stale_unbind_after_rebind_keeps_new_binding() {
        let registry = SessionRegistry::new();
        registry.bind("alice", handle("conn_1"));
        registry.bind("alice", handle("conn_2"));

        // The first connection disconnects late; the second binding
        // must survive and no presence transition is reported.
        assert!(registry.unbind("conn_1").is_none());
        let found = registry.lookup("alice").unwrap();
        assert_eq!(found.conn_id, "conn_2");
    }

    #[test]
    fn rebind_on_the_same_connection_is_stable() {
        let registry = SessionRegistry::new();
        registry.bind("alice", handle("conn_1"));
        registry.bind("alice", handle("conn_1"));

        assert_eq!(registry.unbind("conn_1").as_deref(), Some("alice"));
        assert!(registry.lookup("alice").is_none());
    }
}
