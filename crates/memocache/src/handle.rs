//! Process-wide cache handle
//!
//! The handle is created on first use from the configuration file, or
//! installed explicitly at startup. Creation happens under a lock, so
//! concurrent first calls build exactly one handle. [`dispose`] ends the
//! handle's life and releases its store connection; a later call to
//! [`global`] builds a fresh one.

use crate::error::{Error, Result};
use crate::memoizer::{DeferredComputation, Memoizer};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;

static HANDLE: Mutex<Option<Arc<Memoizer>>> = parking_lot::const_mutex(None);

/// The process-wide memoizer, created from the configuration file if needed
pub fn global() -> Result<Arc<Memoizer>> {
    let mut slot = HANDLE.lock();
    if let Some(handle) = slot.as_ref() {
        return Ok(Arc::clone(handle));
    }

    let handle = Arc::new(Memoizer::from_config()?);
    tracing::debug!(server = %handle.settings().server, "Created global cache handle");
    *slot = Some(Arc::clone(&handle));
    Ok(handle)
}

/// Make `memoizer` the process-wide handle
///
/// Fails if a handle already exists; [`dispose`] it first.
pub fn install(memoizer: Memoizer) -> Result<Arc<Memoizer>> {
    let mut slot = HANDLE.lock();
    if slot.is_some() {
        return Err(Error::configuration(
            "a global cache handle is already installed",
        ));
    }
    let handle = Arc::new(memoizer);
    *slot = Some(Arc::clone(&handle));
    Ok(handle)
}

/// Whether a process-wide handle currently exists
pub fn is_initialized() -> bool {
    HANDLE.lock().is_some()
}

/// Remove the process-wide handle and release its store connection
///
/// Does nothing if no handle exists.
pub async fn dispose() -> Result<()> {
    let handle = HANDLE.lock().take();
    match handle {
        Some(handle) => handle.dispose().await,
        None => Ok(()),
    }
}

/// [`Memoizer::execute`] on the process-wide handle
pub async fn memoize<T, E, F, Fut>(deferred: DeferredComputation<F>) -> std::result::Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    T: Serialize + DeserializeOwned,
    E: From<Error>,
{
    let handle = global()?;
    handle.execute(deferred).await
}

/// [`Memoizer::execute_blocking`] on the process-wide handle
pub async fn memoize_blocking<T, E, F>(deferred: DeferredComputation<F>) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Serialize + DeserializeOwned + Send + 'static,
    E: From<Error> + Send + 'static,
{
    let handle = global()?;
    handle.execute_blocking(deferred).await
}
