//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use memocache::{MemoryStore, Store, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Store that records calls and can be told to fail
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub last_set: parking_lot::Mutex<Option<(String, String, Duration)>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_reads() -> Arc<Self> {
        let store = Self::default();
        store.fail_get.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn failing_writes() -> Arc<Self> {
        let store = Self::default();
        store.fail_set.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn last_set(&self) -> Option<(String, String, Duration)> {
        self.last_set.lock().clone()
    }

    /// Write directly, bypassing the counters
    pub async fn seed(&self, key: &str, payload: &str) {
        self.inner
            .set(key, payload, Duration::from_secs(3600))
            .await
            .unwrap();
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StoreError::connection("test:6379", "connection refused"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        *self.last_set.lock() = Some((key.to_string(), payload.to_string(), ttl));
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(StoreError::command("set", "READONLY replica"));
        }
        self.inner.set(key, payload, ttl).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.close().await
    }

    fn endpoint(&self) -> &str {
        "test:6379"
    }
}
