use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Transient health-exclusion markers for replicas.
///
/// Maps `(service name, replica index)` to the instant the exclusion
/// expires. An entry whose expiry lies in the future means the replica must
/// be skipped; an entry whose expiry has passed is logically absent and is
/// removed lazily by the read that observes it. There is at most one entry
/// per key; insertion overwrites.
///
/// # Thread Safety
///
/// All operations take the single internal lock exactly once, so the
/// expiry-check-and-remove pair is atomic relative to every other store
/// operation and concurrent callers always observe either the pre- or
/// post-update map, never a partial state. The lock is never held across an
/// await point.
#[derive(Debug, Default)]
pub struct BlacklistStore {
    entries: Mutex<HashMap<(String, usize), Instant>>,
}

impl BlacklistStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the replica is currently excluded.
    ///
    /// An entry whose expiry has passed is removed here and reported as
    /// healthy. Calling this repeatedly without an intervening `blacklist`
    /// never changes observable state.
    pub fn is_blacklisted(&self, service: &str, index: usize, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let key = (service.to_string(), index);

        match entries.get(&key) {
            Some(&expires_at) if now < expires_at => true,
            Some(_) => {
                // Stale entry: logically absent, drop it on the way out.
                entries.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Excludes the replica until `now + duration`, overwriting any
    /// existing entry for the same key.
    pub fn blacklist(&self, service: &str, index: usize, now: Instant, duration: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert((service.to_string(), index), now + duration);
    }

    /// Removes the entry for the replica, if any.
    pub fn clear(&self, service: &str, index: usize) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(&(service.to_string(), index));
    }

    /// Number of entries currently present, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
