//! Error types for memocache

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use memocache_store::StoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Error type for memoization
///
/// Store outages never appear here during a memoized call; they degrade the
/// call to a recomputation instead. Failures of the wrapped computation are
/// the caller's own error type and are not wrapped either.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Settings are missing or invalid
    #[error("Cache configuration error: {message}")]
    #[diagnostic(
        code(memocache::config),
        help("The `cache` section needs a valid `Server` host or IP and a positive `TTL` in hours")
    )]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// An argument could not be turned into a fingerprint contribution
    #[error("Cannot resolve argument {index}: {message}")]
    #[diagnostic(
        code(memocache::unresolvable_argument),
        help("Pass the value itself, or opt into ArgumentPolicy::Describe")
    )]
    UnresolvableArgument {
        /// Position of the argument in the call
        index: usize,
        /// Why resolution failed
        message: String,
    },

    /// A cached payload does not decode into the requested type
    #[error("Cached value for {key} cannot be decoded")]
    #[diagnostic(
        code(memocache::deserialization),
        help("The entry was written by an incompatible version of the result type")
    )]
    Deserialization {
        /// Key of the offending entry
        key: String,
        /// The underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// The store failed while being released
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    /// A blocking computation was cancelled before it finished
    #[error("Blocking computation did not complete: {message}")]
    #[diagnostic(code(memocache::join))]
    Join {
        /// Error message from the runtime
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an unresolvable argument error
    #[must_use]
    pub fn unresolvable(index: usize, msg: impl Into<String>) -> Self {
        Self::UnresolvableArgument {
            index,
            message: msg.into(),
        }
    }

    /// Create a deserialization error for the entry at `key`
    #[must_use]
    pub fn deserialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Deserialization {
            key: key.into(),
            source,
        }
    }
}

/// Result type for memocache operations
///
/// The error parameter defaults to [`Error`]; memoized calls return the
/// caller's own error type instead.
pub type Result<T, E = Error> = std::result::Result<T, E>;
