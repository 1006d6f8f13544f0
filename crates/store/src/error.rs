//! Error types for the store crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for store operations
#[derive(Error, Debug, Diagnostic)]
pub enum StoreError {
    /// The server could not be reached
    #[error("Failed to connect to {endpoint}: {message}")]
    #[diagnostic(
        code(memocache::store::connection),
        help("Check that the cache server is running and reachable")
    )]
    Connection {
        /// Address that was dialled
        endpoint: String,
        /// Error message describing the failure
        message: String,
    },

    /// The server rejected or failed a command
    #[error("Store {operation} failed: {message}")]
    #[diagnostic(code(memocache::store::command))]
    Command {
        /// Command that failed (e.g., "get", "set")
        operation: String,
        /// Error message describing the failure
        message: String,
    },

    /// An operation did not complete in time
    #[error("Store {operation} timed out after {millis}ms")]
    #[diagnostic(code(memocache::store::timeout))]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Time limit in milliseconds
        millis: u64,
    },

    /// The store was used after its connection was released
    #[error("Store connection has been closed")]
    #[diagnostic(
        code(memocache::store::closed),
        help("The cache handle was disposed; create a new one to keep caching")
    )]
    Closed,

    /// Expiry is too short to be represented by the store
    #[error("Invalid TTL of {seconds}s: expiry must be at least one second")]
    #[diagnostic(code(memocache::store::invalid_ttl))]
    InvalidTtl {
        /// Requested expiry in whole seconds
        seconds: u64,
    },
}

impl StoreError {
    /// Create a connection error
    #[must_use]
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a command error
    #[must_use]
    pub fn command(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, millis: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            millis,
        }
    }

    /// Classify a Redis client error raised while running `operation`
    ///
    /// Transport failures become [`StoreError::Connection`] so the caller can
    /// tell an unreachable server apart from a rejected command.
    #[must_use]
    pub fn from_redis(operation: &str, endpoint: &str, err: &redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            Self::connection(endpoint, err.to_string())
        } else {
            Self::command(operation, err.to_string())
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::connection("10.0.0.1:6379", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to connect to 10.0.0.1:6379: connection refused"
        );

        let err = StoreError::command("set", "WRONGTYPE");
        assert_eq!(err.to_string(), "Store set failed: WRONGTYPE");

        let err = StoreError::timeout("connect", 250);
        assert_eq!(err.to_string(), "Store connect timed out after 250ms");

        assert_eq!(
            StoreError::Closed.to_string(),
            "Store connection has been closed"
        );
    }

    #[test]
    fn test_redis_io_error_is_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::from_redis("get", "10.0.0.1:6379", &redis::RedisError::from(io));
        assert!(matches!(
            err,
            StoreError::Connection { ref endpoint, .. } if endpoint == "10.0.0.1:6379"
        ));
    }

    #[test]
    fn test_redis_response_error_is_command() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::TypeError, "bad type"));
        let err = StoreError::from_redis("set", "10.0.0.1:6379", &redis_err);
        assert!(matches!(
            err,
            StoreError::Command { ref operation, .. } if operation == "set"
        ));
    }
}
