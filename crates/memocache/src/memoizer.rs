//! Cache-aside execution of deferred computations

use crate::argument::ArgumentPolicy;
use crate::error::{Error, Result};
use crate::fingerprint::{CacheKey, Call, compute_key};
use crate::settings::Settings;
use memocache_store::{RedisStore, Store, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// A call to run only if its result is not already cached
pub struct DeferredComputation<F> {
    /// Identity and arguments the cache key is derived from
    pub call: Call,
    /// Produces the result on a miss
    pub thunk: F,
}

impl<F> DeferredComputation<F> {
    /// Pair a call description with the closure that computes it
    pub fn new(call: Call, thunk: F) -> Self {
        Self { call, thunk }
    }
}

/// Outcome of reading a key from the store
#[derive(Debug)]
pub enum Lookup {
    /// A payload is stored under the key
    Hit(String),
    /// Nothing is stored under the key
    Miss,
    /// The store could not answer; treated as a miss
    Unavailable(StoreError),
}

/// Memoizes computations in a key-value store
///
/// Store failures never fail a call: an unreadable store means the value is
/// recomputed, an unwritable one means it is returned without being cached.
/// A cached payload that does not decode, an argument that cannot be
/// fingerprinted, or a failing computation do fail the call.
pub struct Memoizer {
    store: Arc<dyn Store>,
    settings: Settings,
    policy: ArgumentPolicy,
}

impl Memoizer {
    /// Create a memoizer over an existing store
    pub fn new(settings: Settings, store: Arc<dyn Store>) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            store,
            settings,
            policy: ArgumentPolicy::default(),
        })
    }

    /// Create a memoizer over a Redis server described by `settings`
    ///
    /// The connection is opened on the first cached call.
    pub fn connect(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let store = RedisStore::new(
            &settings.server,
            settings.port,
            settings.connect_timeout(),
        )
        .map_err(|e| Error::configuration(e.to_string()))?;
        Self::new(settings, Arc::new(store))
    }

    /// Create a memoizer from the configuration file
    pub fn from_config() -> Result<Self> {
        Self::connect(Settings::load()?)
    }

    /// Choose how arguments that cannot be resolved are treated
    #[must_use]
    pub fn with_argument_policy(mut self, policy: ArgumentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Settings this memoizer was built with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Cache key `call` is stored under
    pub fn key(&self, call: &Call) -> Result<CacheKey> {
        compute_key(call, self.policy)
    }

    /// Read `key`, folding store failures into [`Lookup::Unavailable`]
    pub async fn lookup(&self, key: &CacheKey) -> Lookup {
        match self.store.get(key.as_str()).await {
            Ok(Some(payload)) => Lookup::Hit(payload),
            Ok(None) => Lookup::Miss,
            Err(err) => Lookup::Unavailable(err),
        }
    }

    /// Return the cached result of `deferred`, computing and caching it on a miss
    ///
    /// An error from the computation is returned unchanged and nothing is
    /// cached.
    pub async fn execute<T, E, F, Fut>(&self, deferred: DeferredComputation<F>) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
        E: From<Error>,
    {
        let DeferredComputation { call, thunk } = deferred;
        let key = self.key(&call)?;

        match self.lookup(&key).await {
            Lookup::Hit(payload) => {
                info!(%key, function = call.name(), "Cache returned stored result");
                return serde_json::from_str(&payload)
                    .map_err(|e| Error::deserialization(key.as_str(), e).into());
            }
            Lookup::Miss => {
                warn!(%key, function = call.name(), "No cached result, computing");
            }
            Lookup::Unavailable(err) => {
                warn!(
                    endpoint = self.store.endpoint(),
                    error = %err,
                    "Failed to read from cache store, recomputing"
                );
            }
        }

        let fresh = thunk().await?;
        self.save(&key, &fresh).await;
        Ok(fresh)
    }

    /// Like [`Memoizer::execute`], for a synchronous computation
    ///
    /// The computation runs on the blocking thread pool so other cache
    /// operations keep making progress. A panic inside it is resumed here.
    pub async fn execute_blocking<T, E, F>(&self, deferred: DeferredComputation<F>) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Serialize + DeserializeOwned + Send + 'static,
        E: From<Error> + Send + 'static,
    {
        let DeferredComputation { call, thunk } = deferred;
        let on_blocking_pool = move || async move {
            match tokio::task::spawn_blocking(thunk).await {
                Ok(result) => result,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(Error::Join {
                    message: e.to_string(),
                }
                .into()),
            }
        };
        self.execute(DeferredComputation::new(call, on_blocking_pool))
            .await
    }

    /// Release the store connection
    pub async fn dispose(&self) -> Result<()> {
        self.store.close().await?;
        info!(endpoint = self.store.endpoint(), "Cache store released");
        Ok(())
    }

    /// Best-effort write of a fresh result
    async fn save<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%key, error = %err, "Result cannot be serialized, not caching");
                return;
            }
        };

        match self
            .store
            .set(key.as_str(), &payload, self.settings.ttl_duration())
            .await
        {
            Ok(()) => info!(%key, "Cached new result"),
            Err(err) => warn!(
                endpoint = self.store.endpoint(),
                error = %err,
                "Failed to write to cache store"
            ),
        }
    }
}
