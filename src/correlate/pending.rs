use crate::correlate::observation::{InputKey, Observation};
use std::collections::HashMap;

/// Unmatched observations for one producer, at most one per key.
///
/// An entry exists only between the moment its producer saw the change and
/// the moment the correlator matches it (or overwrites it with a newer
/// sighting). `insert` is latest-wins: a rapid re-fire for the same key
/// silently displaces the older unmatched entry rather than growing the
/// table.
#[derive(Debug, Default)]
pub struct PendingTable {
    entries: HashMap<InputKey, Observation>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts an observation, returning the displaced one if the key was
    /// already pending.
    pub fn insert(&mut self, key: InputKey, observation: Observation) -> Option<Observation> {
        self.entries.insert(key, observation)
    }

    /// Reads the pending entry without consuming it.
    pub fn peek(&self, key: &InputKey) -> Option<&Observation> {
        self.entries.get(key)
    }

    /// Removes and returns the pending entry, transferring ownership to the
    /// caller. This is the only way an entry leaves the table besides
    /// overwrite and [`clear`](Self::clear).
    pub fn take(&mut self, key: &InputKey) -> Option<Observation> {
        self.entries.remove(key)
    }

    /// Drops every pending entry. Used on device disconnect so stale
    /// observations can never match a reconnected device.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
