//! Key-based query cache with a stale-time policy.
//!
//! Values are kept as JSON so one map can hold every response type. A fetch
//! for a key holds that key's gate, so concurrent callers for the same key
//! wait and then read the first caller's result instead of hitting the API.

use crate::api::ApiError;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
}

#[derive(Clone)]
pub struct QueryCache {
    stale_time: Duration,
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    gates: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: Arc::new(Mutex::new(HashMap::new())),
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn key(parts: &[&str]) -> String {
        parts.join("/")
    }

    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.fresh(key).await {
            return Ok(value);
        }

        let gate = {
            let mut gates = self.gates.lock().await;
            Arc::clone(gates.entry(key.to_string()).or_default())
        };
        let result = {
            let _held = gate.lock().await;
            // Another caller may have filled the entry while we waited.
            match self.fresh(key).await {
                Some(value) => Ok(value),
                None => self.fetch_and_store(key, fetch).await,
            }
        };
        self.release_gate(key, gate).await;
        result
    }

    async fn fetch_and_store<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T, ApiError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let value = fetch().await?;
        match serde_json::to_value(&value) {
            Ok(json) => {
                let mut entries = self.entries.lock().await;
                let stale_time = self.stale_time;
                entries.retain(|_, entry| entry.fetched_at.elapsed() < stale_time);
                entries.insert(
                    key.to_string(),
                    CacheEntry {
                        value: json,
                        fetched_at: Instant::now(),
                    },
                );
            }
            Err(err) => warn!("not caching {key}: {err}"),
        }
        Ok(value)
    }

    /// Drops the key's gate unless another caller still holds a handle to it.
    /// Handles are only cloned under the `gates` lock, so the count is exact.
    async fn release_gate(&self, key: &str, gate: Arc<Mutex<()>>) {
        let mut gates = self.gates.lock().await;
        drop(gate);
        if gates.get(key).is_some_and(|held| Arc::strong_count(held) == 1) {
            gates.remove(key);
        }
    }

    async fn fresh<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() >= self.stale_time {
            return None;
        }
        debug!("cache hit {key}");
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Removes matching entries along with anything already stale.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let stale_time = self.stale_time;
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, entry| {
            !key.starts_with(prefix) && entry.fetched_at.elapsed() < stale_time
        });
        debug!("invalidated {} cache entries under {prefix}", before - entries.len());
        drop(entries);

        self.gates
            .lock()
            .await
            .retain(|key, gate| !key.starts_with(prefix) || Arc::strong_count(gate) > 1);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(counter: &AtomicUsize, value: u32) -> Result<u32, ApiError> {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(value)
    }

    #[tokio::test]
    async fn fresh_entries_skip_the_fetch() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_fetch("s1/insights", || counted(&calls, 1)).await.unwrap();
        let second = cache.get_or_fetch("s1/insights", || counted(&calls, 2)).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entries_are_refetched() {
        let cache = QueryCache::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);

        cache.get_or_fetch("k", || counted(&calls, 1)).await.unwrap();
        let second = cache.get_or_fetch("k", || counted(&calls, 2)).await.unwrap();

        assert_eq!(second, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_request() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k", || counted(&calls, 5)),
            cache.get_or_fetch("k", || counted(&calls, 6)),
        );

        assert_eq!(a.unwrap(), 5);
        assert_eq!(b.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let failed: Result<u32, _> = cache
            .get_or_fetch("k", || async { Err(ApiError::Timeout(5)) })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn gates_do_not_outlive_their_fetch() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for i in 0..50 {
            let key = format!("s{i}/bookmarks");
            cache.get_or_fetch(&key, || counted(&calls, i)).await.unwrap();
            cache.invalidate_prefix(&format!("s{i}/")).await;
        }
        let failed: Result<u32, _> = cache
            .get_or_fetch("s0/insights", || async { Err(ApiError::Timeout(5)) })
            .await;
        assert!(failed.is_err());

        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.gates.lock().await.len(), 0);
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_insert() {
        let cache = QueryCache::new(Duration::from_millis(30));
        let calls = AtomicUsize::new(0);
        cache.get_or_fetch("s1/summary", || counted(&calls, 1)).await.unwrap();
        cache.get_or_fetch("s2/summary", || counted(&calls, 1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.get_or_fetch("s3/summary", || async { Ok(3u32) }).await.unwrap();

        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn invalidate_prefix_only_touches_matching_keys() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        cache.get_or_fetch("s1/bookmarks", || counted(&calls, 1)).await.unwrap();
        cache.get_or_fetch("s2/bookmarks", || counted(&calls, 1)).await.unwrap();

        cache.invalidate_prefix("s1/").await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(QueryCache::key(&["s2", "bookmarks"]), "s2/bookmarks");
    }
}
