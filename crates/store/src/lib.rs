//! Key-value store clients for memocache
//!
//! This crate defines the [`Store`] capability the memoizer writes through:
//! - `GET` of an optional string payload
//! - `SET` of a string payload with an expiry
//! - explicit release of the underlying connection
//!
//! Two implementations are provided. [`RedisStore`] talks to a Redis server
//! over a single multiplexed connection that is opened on first use.
//! [`MemoryStore`] keeps entries in process memory and honours the same
//! expiry semantics.

mod error;
mod memory;
mod redis_store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use redis_store::{DEFAULT_REDIS_PORT, RedisStore};

use async_trait::async_trait;
use std::time::Duration;

/// A key-value store with get/set-with-expiry semantics
///
/// Implementations must be safe to share between concurrent calls. Errors are
/// returned, never logged here; deciding whether a failure is fatal belongs
/// to the caller.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the payload stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `payload` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<()>;

    /// Release the underlying connection
    ///
    /// Every call made after `close` fails with [`StoreError::Closed`].
    async fn close(&self) -> Result<()>;

    /// Address of the backing server, for log fields
    fn endpoint(&self) -> &str;
}
