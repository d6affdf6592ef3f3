//! The replicated state machine: a versioned key/value map.
//!
//! A single mutex guards both the map and the global version counter so
//! that version allocation (leader) and the read-modify-write in
//! `apply_remote` (follower) are each atomic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// A stored value together with the version that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    pub version: u64,
}

/// A write to be shipped from the leader to every follower.
///
/// `value` is ignored by followers when `delete` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationMessage {
    pub key: String,
    pub value: String,
    pub version: u64,
    #[serde(default)]
    pub delete: bool,
}

impl ReplicationMessage {
    pub fn write(key: impl Into<String>, value: impl Into<String>, version: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            version,
            delete: false,
        }
    }

    pub fn delete(key: impl Into<String>, version: u64) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            version,
            delete: true,
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    global_version: u64,
}

/// Thread-safe `key -> (value, version)` map with a monotonic global
/// version counter, shared by leader and follower nodes alike.
#[derive(Default)]
pub struct KvStore {
    inner: Mutex<Inner>,
}

impl KvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leader only: assigns the next version, stores the value, returns
    /// the assigned version.
    pub fn apply_local_write(&self, key: &str, value: &str) -> u64 {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.global_version += 1;
        let version = inner.global_version;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                version,
            },
        );
        version
    }

    /// Leader only: assigns the next version, removes the key, returns
    /// the assigned version.
    pub fn apply_local_delete(&self, key: &str) -> u64 {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.global_version += 1;
        let version = inner.global_version;
        inner.entries.remove(key);
        version
    }

    /// Follower only: applies a replication message if its version is
    /// at least as new as what's already stored for that key. Returns
    /// whether the state actually changed. Stale messages are dropped
    /// silently (and acknowledged anyway by the caller).
    pub fn apply_remote(&self, msg: &ReplicationMessage) -> bool {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let current_version = inner.entries.get(&msg.key).map(|e| e.version);
        if matches!(current_version, Some(current) if msg.version < current) {
            return false;
        }

        if msg.delete {
            inner.entries.remove(&msg.key);
        } else {
            inner.entries.insert(
                msg.key.clone(),
                Entry {
                    value: msg.value.clone(),
                    version: msg.version,
                },
            );
        }
        if msg.version > inner.global_version {
            inner.global_version = msg.version;
        }
        true
    }

    /// Returns a snapshot of the entry for `key`, if present.
    pub fn read(&self, key: &str) -> Option<Entry> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.entries.get(key).cloned()
    }

    /// Returns `(global_version, key_count)`, used by `GET /status`.
    pub fn snapshot_stats(&self) -> (u64, usize) {
        let inner = self.inner.lock().expect("store lock poisoned");
        (inner.global_version, inner.entries.len())
    }
}
