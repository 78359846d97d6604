//! In-process park queue adapter.
//!
//! A process-scoped key-value buffer with per-key expiry and prefix scans.
//! Deployments that want the park queue to survive the process implement
//! `ParkStore` over an external key-value service instead.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

use super::{ParkStore, StoreError};

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Park queue held in process memory.
#[derive(Default)]
pub struct MemoryParkStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryParkStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_live(entry: &Entry, now: DateTime<Utc>) -> bool {
        entry.expires_at > now
    }

    /// Drop expired entries. Expiry is otherwise lazy (checked on read).
    fn evict_expired(&self) {
        let now = Utc::now();
        self.entries.write().retain(|_, e| Self::is_live(e, now));
    }
}

#[async_trait]
impl ParkStore for MemoryParkStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| StoreError::Database(format!("bad ttl: {}", e)))?;
        self.entries.write().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Utc::now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|e| Self::is_live(e, now))
            .map(|e| e.value.clone()))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.evict_expired();
        let entries = self.entries.read();
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.entries.write().clear();
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
