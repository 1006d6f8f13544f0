//! Redis-backed store

use crate::Store;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Port Redis listens on unless configured otherwise
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Store backed by a Redis server
///
/// The connection is opened on first use and shared by every caller; a
/// multiplexed connection pipelines concurrent commands over one socket. A
/// failed connect is not remembered, so the next operation dials again.
pub struct RedisStore {
    client: redis::Client,
    endpoint: String,
    connect_timeout: Duration,
    connection: Mutex<Option<MultiplexedConnection>>,
    closed: AtomicBool,
}

impl RedisStore {
    /// Create a store for the server at `host:port`
    ///
    /// No connection is made until the first `get` or `set`.
    pub fn new(host: &str, port: u16, connect_timeout: Duration) -> Result<Self> {
        let endpoint = endpoint(host, port);
        let url = format!("redis://{endpoint}/");
        let client = redis::Client::open(url.as_str())
            .map_err(|e| StoreError::from_redis("open", &endpoint, &e))?;

        Ok(Self {
            client,
            endpoint,
            connect_timeout,
            connection: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Get the shared connection, dialling the server if needed
    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut guard = self.connection.lock().await;
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        debug!(endpoint = %self.endpoint, "Connecting to Redis server");
        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_tokio_connection(),
        )
        .await
        .map_err(|_| StoreError::timeout("connect", millis(self.connect_timeout)))?
        .map_err(|e| StoreError::from_redis("connect", &self.endpoint, &e))?;

        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Drop a broken connection so the next call reconnects
    async fn discard_on_disconnect(&self, err: &StoreError) {
        if matches!(err, StoreError::Connection { .. }) {
            self.connection.lock().await.take();
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                let err = StoreError::from_redis("get", &self.endpoint, &e);
                self.discard_on_disconnect(&err).await;
                Err(err)
            }
        }
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<()> {
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return Err(StoreError::InvalidTtl { seconds });
        }

        let mut conn = self.connection().await?;
        match conn.set_ex::<_, _, ()>(key, payload, seconds).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = StoreError::from_redis("set", &self.endpoint, &e);
                self.discard_on_disconnect(&err).await;
                Err(err)
            }
        }
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.connection.lock().await;
        self.closed.store(true, Ordering::Release);
        if guard.take().is_some() {
            debug!(endpoint = %self.endpoint, "Released Redis connection");
        }
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn endpoint(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(addr)) => format!("[{addr}]:{port}"),
        _ => format!("{host}:{port}"),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_formatting() {
        assert_eq!(endpoint("127.0.0.1", 6379), "127.0.0.1:6379");
        assert_eq!(endpoint("cache.internal", 6380), "cache.internal:6380");
        assert_eq!(endpoint("::1", DEFAULT_REDIS_PORT), "[::1]:6379");
    }

    #[test]
    fn test_new_does_not_connect() {
        let store = RedisStore::new("192.0.2.1", DEFAULT_REDIS_PORT, Duration::from_secs(1));
        assert!(store.is_ok());
        assert_eq!(store.unwrap().endpoint(), "192.0.2.1:6379");
    }

    #[tokio::test]
    async fn test_operations_fail_after_close() {
        let store = RedisStore::new("127.0.0.1", 1, Duration::from_millis(100)).unwrap();
        store.close().await.unwrap();

        assert!(matches!(store.get("k").await, Err(StoreError::Closed)));
        assert!(matches!(
            store.set("k", "v", Duration::from_secs(60)).await,
            Err(StoreError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_sub_second_ttl_rejected_before_connecting() {
        let store = RedisStore::new("127.0.0.1", 1, Duration::from_millis(100)).unwrap();
        let result = store.set("k", "v", Duration::from_millis(500)).await;
        assert!(matches!(result, Err(StoreError::InvalidTtl { seconds: 0 })));
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_error() {
        let store = RedisStore::new("127.0.0.1", 1, Duration::from_millis(500)).unwrap();
        let result = store.get("k").await;
        assert!(
            matches!(
                result,
                Err(StoreError::Connection { .. } | StoreError::Timeout { .. })
            ),
            "expected connection failure, got {result:?}"
        );
    }
}
