// cooldown.rs - Per (user, command) throttle
// Entries expire once their window has passed. Expired entries are dropped
// lazily on lookup, by `purge_expired`, and whenever the map grows past its
// capacity, so only live windows take up memory.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::model::UserId;

pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Allowed,
    Remaining(Duration),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    stamped: Instant,
    duration: Duration,
}

impl Entry {
    fn expires(&self) -> Instant {
        self.stamped + self.duration
    }
}

type Key = (UserId, String);

pub struct CooldownGate {
    entries: Mutex<HashMap<Key, Entry>>,
    capacity: usize,
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CooldownGate {
    pub fn new(capacity: usize) -> Self {
        CooldownGate {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub async fn check(&self, user: UserId, command: &str) -> CooldownStatus {
        let mut entries = self.entries.lock().await;
        status(&mut entries, &(user, command.to_lowercase()), Instant::now())
    }

    /// Starts a cooldown window; a zero duration records nothing
    pub async fn record(&self, user: UserId, command: &str, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().await;
        self.stamp(&mut entries, (user, command.to_lowercase()), duration, Instant::now());
    }

    /// Checks and, when allowed, records in one step
    pub async fn hit(&self, user: UserId, command: &str, duration: Duration) -> CooldownStatus {
        let key = (user, command.to_lowercase());
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let result = status(&mut entries, &key, now);
        if result == CooldownStatus::Allowed && !duration.is_zero() {
            self.stamp(&mut entries, key, duration, now);
        }
        result
    }

    /// Drops every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, e| e.expires() > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn stamp(&self, entries: &mut HashMap<Key, Entry>, key: Key, duration: Duration, now: Instant) {
        entries.insert(key, Entry { stamped: now, duration });
        if entries.len() > self.capacity {
            entries.retain(|_, e| e.expires() > now);
        }
    }
}

fn status(entries: &mut HashMap<Key, Entry>, key: &Key, now: Instant) -> CooldownStatus {
    match entries.get(key) {
        Some(entry) if entry.expires() > now => CooldownStatus::Remaining(entry.expires() - now),
        Some(_) => {
            entries.remove(key);
            CooldownStatus::Allowed
        }
        None => CooldownStatus::Allowed,
    }
}
