//! In-process store

use crate::Store;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    payload: String,
    /// `None` when the TTL overflows the clock, i.e. never
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Store that keeps entries in process memory
///
/// Entries expire exactly like they would on a remote server: an expired
/// entry reads as absent and is evicted on that read. Every write also
/// drops all entries that have expired.
pub struct MemoryStore {
    entries: Mutex<Option<HashMap<String, Entry>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Some(HashMap::new())),
        }
    }

    /// Number of entries that have not yet expired
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .as_ref()
            .map_or(0, |m| m.values().filter(|e| e.is_live(now)).count())
    }

    /// Whether the store holds no live entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut guard = self.entries.lock();
        let entries = guard.as_mut().ok_or(StoreError::Closed)?;

        match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => Ok(Some(entry.payload.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<()> {
        let mut guard = self.entries.lock();
        let entries = guard.as_mut().ok_or(StoreError::Closed)?;
        let now = Instant::now();

        // Expired entries for keys that are never read again go here
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                payload: payload.to_string(),
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.entries.lock().take();
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "memory"
    }
}
