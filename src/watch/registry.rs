// src/watch/registry.rs

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, info};

use super::WatchId;
use super::path_utils::RelPath;

/// One directory under observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    id: WatchId,
    path: RelPath,
}

impl WatchEntry {
    pub fn new(id: WatchId, path: RelPath) -> Self {
        Self { id, path }
    }

    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Path relative to the watch root, ending in `/` (empty for the root).
    pub fn relative_path(&self) -> &RelPath {
        &self.path
    }
}

/// Table of live watches keyed by their kernel identifier.
///
/// The table holds at most one entry per identifier. It is the only owner of
/// [`WatchEntry`] values; everything else refers to a watch by its id and
/// re-checks the table before using it, so a removed (and possibly reused)
/// identifier is never resolved to a stale path.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    entries: HashMap<WatchId, WatchEntry>,
}

impl WatchRegistry {
    /// Create an empty registry sized for `capacity` watches.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Register `path` under `id`.
    ///
    /// If `id` is already registered the existing entry is returned unchanged.
    pub fn add(&mut self, id: WatchId, path: RelPath) -> &WatchEntry {
        match self.entries.entry(id) {
            Entry::Occupied(existing) => {
                debug!(
                    id = %id,
                    path = %existing.get().relative_path(),
                    "watch already registered"
                );
                existing.into_mut()
            }
            Entry::Vacant(slot) => {
                info!(id = %id, path = %path, "[+] watch registered");
                slot.insert(WatchEntry::new(id, path))
            }
        }
    }

    pub fn lookup(&self, id: WatchId) -> Option<&WatchEntry> {
        self.entries.get(&id)
    }

    /// Remove the entry for `id`; returns whether one was present.
    pub fn remove(&mut self, id: WatchId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                info!(id = %id, path = %entry.relative_path(), "[-] watch removed");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: WatchId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchEntry> {
        self.entries.values()
    }

    /// Release every entry, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let released = self.entries.len();
        self.entries.clear();
        released
    }
}
