//! Request memoization keyed by resource and parameters.
//!
//! Reads of the same key share one in-flight fetch. Writes never touch a
//! cached value; callers invalidate the resource and the next read goes
//! back to the server.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: String,
    params: String,
}

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: String::new(),
        }
    }

    /// Parameters are keyed by their canonical JSON form.
    pub fn with_params<P: Serialize>(resource: impl Into<String>, params: &P) -> ClientResult<Self> {
        Ok(Self {
            resource: resource.into(),
            params: serde_json::to_string(params)?,
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.resource)
        } else {
            write!(f, "{}?{}", self.resource, self.params)
        }
    }
}

struct CachedValue {
    fetched_at: Instant,
    value: Arc<dyn Any + Send + Sync>,
}

type Slot = Arc<OnceCell<CachedValue>>;

pub struct QueryCache {
    stale_time: Duration,
    entries: Mutex<HashMap<QueryKey, Slot>>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Returns the cached value for `key`, running `fetcher` when the key is
    /// missing or stale. Errors are returned to every waiter and not cached.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> ClientResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let slot = self.slot_for(&key).await;

        if slot.initialized() {
            debug!(%key, "query cache hit");
        } else {
            debug!(%key, "query cache miss; fetching");
        }
        let cached = slot
            .get_or_try_init(|| async move {
                let value = fetcher().await?;
                Ok::<_, ClientError>(CachedValue {
                    fetched_at: Instant::now(),
                    value: Arc::new(value),
                })
            })
            .await?;

        Arc::clone(&cached.value)
            .downcast::<T>()
            .map_err(|_| ClientError::CacheType(key.to_string()))
    }

    async fn slot_for(&self, key: &QueryKey) -> Slot {
        let mut entries = self.entries.lock().await;
        let slot = Arc::clone(entries.entry(key.clone()).or_default());
        let is_stale = slot
            .get()
            .is_some_and(|cached| cached.fetched_at.elapsed() >= self.stale_time);
        if !is_stale {
            return slot;
        }

        let fresh: Slot = Arc::default();
        entries.insert(key.clone(), Arc::clone(&fresh));
        fresh
    }

    /// Drops every key of `resource`. Fetches already in flight finish into
    /// their own detached slot and do not repopulate the cache.
    pub async fn invalidate(&self, resource: &str) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| key.resource != resource);
        debug!(resource, dropped = before - entries.len(), "invalidated queries");
    }

    pub async fn invalidate_many(&self, resources: &[&str]) {
        let mut entries = self.entries.lock().await;
        entries.retain(|key, _| !resources.contains(&key.resource.as_str()));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn is_cached(&self, key: &QueryKey) -> bool {
        let entries = self.entries.lock().await;
        entries.get(key).is_some_and(|slot| slot.initialized())
    }
}

#[cfg(test)]
#[path = "tests/query_cache_tests.rs"]
mod tests;
