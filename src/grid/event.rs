//! Change-notification events emitted by grid maps.

/// What happened to the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Inserted,
    Updated,
    Removed,
}

/// Why the notification was delivered.
///
/// `Recovery` marks a partition-ownership transfer: the receiving side is the
/// new owner of the key and must treat the event as a replay of current state,
/// not a fresh mutation. `Expiry` marks an entry purged by its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCause {
    Regular,
    Recovery,
    Expiry,
}

/// A single entry change: (old, new) snapshots plus kind and cause.
#[derive(Debug, Clone)]
pub struct EntryEvent<V> {
    pub key: String,
    pub old: Option<V>,
    pub new: Option<V>,
    pub kind: EventKind,
    pub cause: EventCause,
}

impl<V> EntryEvent<V> {
    pub fn is_insert(&self) -> bool {
        self.kind == EventKind::Inserted
    }

    pub fn is_update(&self) -> bool {
        self.kind == EventKind::Updated
    }

    pub fn is_removal(&self) -> bool {
        self.kind == EventKind::Removed
    }

    /// True when the cause is a partition-ownership recovery replay.
    pub fn is_recovery(&self) -> bool {
        self.cause == EventCause::Recovery
    }
}
