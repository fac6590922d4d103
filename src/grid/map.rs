//! Named key-value maps with atomic per-key invoke semantics.
//!
//! `GridMap` is the embedded stand-in for a clustered data grid partition. It
//! guarantees at-most-one-concurrent-writer per key (`invoke` holds the key's
//! shard slot for the duration of the closure), emits change events in per-key
//! modification order, supports per-entry expiry, and carries a
//! locality/recovery control surface so ownership transfer can be simulated in
//! a single process.
//!
//! The closure passed to `invoke` must not touch the same map again; per-key
//! exclusivity makes that a deadlock.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use super::event::{EntryEvent, EventCause, EventKind};
use crate::constants::DEFAULT_EVENT_CHANNEL_CAPACITY;

struct Slot<V> {
    value: V,
    expires_at: Option<Instant>,
}

/// Mutable view of one entry during an `invoke` call.
///
/// Reads never mark the entry dirty; only `set` and `remove` do, and only
/// dirty entries produce change events. Processors that decide there is no
/// work therefore leave no trace.
pub struct MapEntry<'a, V> {
    key: &'a str,
    value: Option<V>,
    was_present: bool,
    expires_at: Option<Instant>,
    dirty: bool,
    expiry_change: Option<Option<Duration>>,
}

impl<'a, V> MapEntry<'a, V> {
    pub fn key(&self) -> &str {
        self.key
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Replaces (or creates) the entry value.
    pub fn set(&mut self, value: V) {
        self.value = Some(value);
        self.dirty = true;
    }

    /// Removes the entry, returning the previous value.
    pub fn remove(&mut self) -> Option<V> {
        self.dirty = true;
        self.value.take()
    }

    /// Sets the entry's expiry: `Some(ttl)` to expire after `ttl`, `None` to
    /// never expire. Takes effect only if the entry still exists afterwards.
    pub fn set_expiry(&mut self, ttl: Option<Duration>) {
        self.expiry_change = Some(ttl);
    }

    /// Whether the entry's TTL has passed as of `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// A named map with atomic per-key read-modify-write and change notification.
pub struct GridMap<V> {
    name: String,
    slots: DashMap<String, Slot<V>>,
    events: broadcast::Sender<EntryEvent<V>>,
    non_local: RwLock<HashSet<String>>,
}

impl<V> fmt::Debug for GridMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridMap")
            .field("name", &self.name)
            .field("len", &self.slots.len())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> GridMap<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(name: impl Into<String>, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            name: name.into(),
            slots: DashMap::new(),
            events,
            non_local: RwLock::new(HashSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically reads, modifies, and writes the entry for `key`.
    ///
    /// The closure runs with exclusive access to the key; concurrent invokes
    /// against the same key serialize, and change events are emitted before
    /// exclusivity is released, so subscribers observe them in modification
    /// order.
    pub fn invoke<R>(&self, key: &str, f: impl FnOnce(&mut MapEntry<'_, V>) -> R) -> R {
        self.invoke_cause(key, EventCause::Regular, f)
    }

    fn invoke_cause<R>(
        &self,
        key: &str,
        cause: EventCause,
        f: impl FnOnce(&mut MapEntry<'_, V>) -> R,
    ) -> R {
        enum Occupancy<'a, V> {
            Present(dashmap::mapref::entry::OccupiedEntry<'a, String, Slot<V>>),
            Absent(dashmap::mapref::entry::VacantEntry<'a, String, Slot<V>>),
        }

        let occupancy = match self.slots.entry(key.to_string()) {
            Entry::Occupied(occupied) => Occupancy::Present(occupied),
            Entry::Vacant(vacant) => Occupancy::Absent(vacant),
        };

        let (old_value, old_expiry) = match &occupancy {
            Occupancy::Present(occupied) => {
                let slot = occupied.get();
                (Some(slot.value.clone()), slot.expires_at)
            }
            Occupancy::Absent(_) => (None, None),
        };

        let mut entry = MapEntry {
            key,
            value: old_value.clone(),
            was_present: old_value.is_some(),
            expires_at: old_expiry,
            dirty: false,
            expiry_change: None,
        };
        let result = f(&mut entry);

        if entry.dirty || entry.expiry_change.is_some() {
            let expires_at = match entry.expiry_change {
                Some(Some(ttl)) => Some(Instant::now() + ttl),
                Some(None) => None,
                None => old_expiry,
            };
            // Events are sent while the slot is still held so per-key order
            // matches modification order.
            match (entry.value, occupancy) {
                (Some(new_value), Occupancy::Present(mut occupied)) => {
                    occupied.insert(Slot {
                        value: new_value.clone(),
                        expires_at,
                    });
                    if entry.dirty {
                        self.emit(key, old_value, Some(new_value), EventKind::Updated, cause);
                    }
                }
                (Some(new_value), Occupancy::Absent(vacant)) => {
                    let guard = vacant.insert(Slot {
                        value: new_value.clone(),
                        expires_at,
                    });
                    self.emit(key, None, Some(new_value), EventKind::Inserted, cause);
                    drop(guard);
                }
                (None, Occupancy::Present(occupied)) => {
                    self.emit(key, old_value, None, EventKind::Removed, cause);
                    occupied.remove();
                }
                (None, Occupancy::Absent(_)) => {}
            }
        }

        result
    }

    /// Inserts or replaces a value outside an invoke closure.
    pub fn insert(&self, key: &str, value: V) {
        self.invoke(key, |entry| entry.set(value));
    }

    /// Inserts a value with a TTL.
    pub fn insert_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        self.invoke(key, |entry| {
            entry.set(value);
            entry.set_expiry(Some(ttl));
        });
    }

    /// Removes an entry, returning its value.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.invoke(key, |entry| entry.remove())
    }

    /// Snapshot read of one value.
    pub fn get(&self, key: &str) -> Option<V> {
        self.slots.get(key).map(|slot| slot.value.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of all keys.
    pub fn keys(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.key().clone()).collect()
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<(String, V)> {
        self.slots
            .iter()
            .map(|slot| (slot.key().clone(), slot.value().value.clone()))
            .collect()
    }

    /// Subscribes to this map's change stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EntryEvent<V>> {
        self.events.subscribe()
    }

    /// Removes every entry whose TTL has passed, emitting `Expiry` removals.
    /// Returns the purged keys.
    pub fn remove_expired(&self, now: Instant) -> Vec<String> {
        let candidates: Vec<String> = self
            .slots
            .iter()
            .filter(|slot| matches!(slot.value().expires_at, Some(at) if at <= now))
            .map(|slot| slot.key().clone())
            .collect();

        let mut purged = Vec::new();
        for key in candidates {
            let removed = self.invoke_cause(&key, EventCause::Expiry, |entry| {
                if entry.is_expired(now) {
                    entry.remove().is_some()
                } else {
                    false
                }
            });
            if removed {
                debug!(map = %self.name, key = %key, "grid entry expired");
                purged.push(key);
            }
        }
        purged
    }

    /// Whether this process currently owns `key`. Keys are local by default.
    pub fn is_local(&self, key: &str) -> bool {
        !self.non_local.read().contains(key)
    }

    /// Marks a key as owned (or not) by this process. Simulates the partition
    /// moving to another member without removing the data.
    pub fn set_local(&self, key: &str, local: bool) {
        let mut non_local = self.non_local.write();
        if local {
            non_local.remove(key);
        } else {
            non_local.insert(key.to_string());
        }
    }

    /// Re-establishes local ownership of `keys` and replays their current
    /// state as `Recovery`-cause updates, the notification a new partition
    /// owner receives after a transfer.
    pub fn recover<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            self.set_local(key, true);
            let replayed = self.invoke_cause(key, EventCause::Recovery, |entry| {
                if let Some(value) = entry.get().cloned() {
                    entry.set(value);
                    true
                } else {
                    false
                }
            });
            if replayed {
                debug!(map = %self.name, key = %key, "replayed entry after ownership recovery");
            }
        }
    }

    fn emit(&self, key: &str, old: Option<V>, new: Option<V>, kind: EventKind, cause: EventCause) {
        let event = EntryEvent {
            key: key.to_string(),
            old,
            new,
            kind,
            cause,
        };
        // A send error just means no subscribers are listening right now.
        let _ = self.events.send(event);
    }
}
