//! Tracks which room or peer each user is currently viewing.

use dashmap::DashMap;

/// What a subscriber is currently looking at in their client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    Room(String),
    User(String),
}

/// Per-user view targets, consulted by the router to decide whether an
/// incoming direct message should bump the recipient's unseen counter.
///
/// At most one target per subscriber; setting a new one replaces the
/// old atomically. Entries persist until overwritten or the process
/// restarts — there is no delete.
pub struct SubscriptionTracker {
    targets: DashMap<String, Option<ViewTarget>>,
}

impl SubscriptionTracker {
    pub fn new() -> Self {
        Self {
            targets: DashMap::new(),
        }
    }

    /// Replace the subscriber's target. `None` clears it, used at login
    /// to drop state left over from a previous connection.
    pub fn set(&self, subscriber_id: &str, target: Option<ViewTarget>) {
        self.targets.insert(subscriber_id.to_string(), target);
    }

    /// Whether the subscriber is currently viewing the given target.
    pub fn is_viewing(&self, subscriber_id: &str, target: &ViewTarget) -> bool {
        self.targets
            .get(subscriber_id)
            .map(|current| current.as_ref() == Some(target))
            .unwrap_or(false)
    }
}

impl Default for SubscriptionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_viewing_anything_by_default() {
        let tracker = SubscriptionTracker::new();
        assert!(!tracker.is_viewing("u1", &ViewTarget::Room("room_1".into())));
    }

    #[test]
    fn set_then_is_viewing() {
        let tracker = SubscriptionTracker::new();
        tracker.set("u1", Some(ViewTarget::User("u2".into())));

        assert!(tracker.is_viewing("u1", &ViewTarget::User("u2".into())));
        assert!(!tracker.is_viewing("u1", &ViewTarget::User("u3".into())));
        assert!(!tracker.is_viewing("u1", &ViewTarget::Room("u2".into())));
    }

    #[test]
    fn set_replaces_the_previous_target() {
        let tracker = SubscriptionTracker::new();
        tracker.set("u1", Some(ViewTarget::Room("room_1".into())));
        tracker.set("u1", Some(ViewTarget::User("u2".into())));

        assert!(!tracker.is_viewing("u1", &ViewTarget::Room("room_1".into())));
        assert!(tracker.is_viewing("u1", &ViewTarget::User("u2".into())));
    }

    #[test]
    fn clearing_drops_the_target() {
        let tracker = SubscriptionTracker::new();
        tracker.set("u1", Some(ViewTarget::Room("room_1".into())));
        tracker.set("u1", None);

        assert!(!tracker.is_viewing("u1", &ViewTarget::Room("room_1".into())));
    }

    #[test]
    fn subscribers_are_independent() {
        let tracker = SubscriptionTracker::new();
        tracker.set("u1", Some(ViewTarget::Room("room_1".into())));

        assert!(!tracker.is_viewing("u2", &ViewTarget::Room("room_1".into())));
    }
}
