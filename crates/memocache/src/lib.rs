//! Memoize expensive function calls in a remote key-value store
//!
//! A call is described as data: a function identity, its arguments, and a
//! closure that computes the result. The description is fingerprinted into a
//! cache key; on a hit the stored JSON is decoded and returned, on a miss the
//! closure runs and its result is stored with a time-to-live.
//!
//! # Overview
//!
//! - [`argument`] turns each argument into a canonical string
//! - [`fingerprint`] hashes the function identity and arguments into a [`CacheKey`]
//! - [`Memoizer`] runs the get-or-compute-and-store protocol
//! - [`global`], [`install`] and [`dispose`] manage the process-wide handle
//!
//! # Failure model
//!
//! An unreachable store only costs performance: reads fall through to the
//! computation and writes are skipped. Undecodable cached entries,
//! unresolvable arguments and computation errors fail the call.
//!
//! ```no_run
//! use memocache::{Argument, Call, DeferredComputation, Error, memoize};
//!
//! # async fn run() -> Result<(), Error> {
//! let call = Call::new("Foo").arg(Argument::literal(5));
//! let answer: u32 = memoize(DeferredComputation::new(call, || async { Ok::<_, Error>(42) })).await?;
//! assert_eq!(answer, 42);
//! memocache::dispose().await?;
//! # Ok(())
//! # }
//! ```

pub mod argument;
mod error;
pub mod fingerprint;
mod handle;
pub mod logging;
mod memoizer;
pub mod settings;

pub use argument::{Argument, ArgumentPolicy};
pub use error::{Error, Result};
pub use fingerprint::{CacheKey, Call, compute_key};
pub use handle::{dispose, global, install, is_initialized, memoize, memoize_blocking};
pub use memoizer::{DeferredComputation, Lookup, Memoizer};
pub use settings::Settings;

pub use memocache_store::{MemoryStore, RedisStore, Store, StoreError};
