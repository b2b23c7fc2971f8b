//! Recently-played log
//!
//! Bounded, most-recent-first, deduplicated list of track ids. Replaying a
//! track moves it to the front instead of adding a second entry.

use cadence_core::TrackId;

/// Default log size
pub const DEFAULT_CAPACITY: usize = 20;

/// Record a play against an existing log
///
/// Pure function: returns the new log and leaves persistence to the caller.
pub fn record_play(log: &[TrackId], id: &TrackId, capacity: usize) -> Vec<TrackId> {
    let mut next = Vec::with_capacity(capacity.min(log.len() + 1));
    if capacity == 0 {
        return next;
    }
    next.push(id.clone());
    next.extend(
        log.iter()
            .filter(|existing| *existing != id)
            .take(capacity - 1)
            .cloned(),
    );
    next
}

/// Recently-played tracker owned by a playback session
#[derive(Debug, Clone, PartialEq)]
pub struct RecentlyPlayed {
    /// Most recent first
    entries: Vec<TrackId>,
    capacity: usize,
}

impl RecentlyPlayed {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Rebuild from a persisted log
    ///
    /// Duplicates and entries beyond `capacity` are dropped, keeping the
    /// front-most occurrence.
    pub fn from_ids(ids: Vec<TrackId>, capacity: usize) -> Self {
        let mut entries: Vec<TrackId> = Vec::with_capacity(capacity.min(ids.len()));
        for id in ids {
            if entries.len() >= capacity {
                break;
            }
            if !entries.contains(&id) {
                entries.push(id);
            }
        }
        Self { entries, capacity }
    }

    pub fn record(&mut self, id: &TrackId) {
        self.entries = record_play(&self.entries, id, self.capacity);
    }

    /// Full log, most recent first
    pub fn ids(&self) -> &[TrackId] {
        &self.entries
    }

    /// The `n` most recent ids
    pub fn recent_ids(&self, n: usize) -> &[TrackId] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Resolve the `n` most recent ids, silently dropping ids the lookup
    /// cannot resolve
    pub fn get_recent<T, F>(&self, n: usize, lookup: F) -> Vec<T>
    where
        F: FnMut(&TrackId) -> Option<T>,
    {
        self.recent_ids(n).iter().filter_map(lookup).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RecentlyPlayed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
