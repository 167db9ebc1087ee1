use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::debug;

use super::entry::{CachedData, QueryKey, StaleTime};

/// Capacity of the change notification channel. Slow subscribers that fall
/// further behind than this see `RecvError::Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    Set,
    Removed,
}

/// Change notification sent to subscribers after every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub kind: CacheEventKind,
}

struct Inner<V> {
    entries: RwLock<HashMap<QueryKey, CachedData<V>>>,
    events: broadcast::Sender<CacheEvent>,
}

/// Shared keyed cache of query results.
///
/// Cloning yields another handle to the same table.
pub struct CacheManager<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for CacheManager<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for CacheManager<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheManager<V> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    // A panic while holding the lock can't leave a half-written entry, so a
    // poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<QueryKey, CachedData<V>>> {
        self.inner.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<QueryKey, CachedData<V>>> {
        self.inner.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, key: &QueryKey, kind: CacheEventKind) {
        // No subscribers is fine
        let _ = self.inner.events.send(CacheEvent {
            key: key.clone(),
            kind,
        });
    }

    /// Receive a `CacheEvent` for every write made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.read().contains_key(key)
    }

    /// Store `value` under `key`, returning the entry it replaced.
    pub fn set(&self, key: &QueryKey, value: V) -> Option<CachedData<V>> {
        self.put_entry(key, CachedData::new(value))
    }

    /// Store a complete entry, keeping its original timestamp.
    pub fn put_entry(&self, key: &QueryKey, entry: CachedData<V>) -> Option<CachedData<V>> {
        let previous = self.write().insert(key.clone(), entry);
        debug!(key = %key, replaced = previous.is_some(), "Cache entry set");
        self.notify(key, CacheEventKind::Set);
        previous
    }

    pub fn remove(&self, key: &QueryKey) -> Option<CachedData<V>> {
        let removed = self.write().remove(key);
        if removed.is_some() {
            debug!(key = %key, "Cache entry removed");
            self.notify(key, CacheEventKind::Removed);
        }
        removed
    }

    /// True when the entry is absent or older than `stale_time`.
    pub fn is_stale(&self, key: &QueryKey, stale_time: StaleTime) -> bool {
        self.read()
            .get(key)
            .map(|entry| entry.is_stale(stale_time))
            .unwrap_or(true)
    }

    pub fn age_display(&self, key: &QueryKey) -> Option<String> {
        self.read().get(key).map(|entry| entry.age_display())
    }
}

impl<V: Clone> CacheManager<V> {
    pub fn get(&self, key: &QueryKey) -> Option<V> {
        self.read().get(key).map(|entry| entry.data.clone())
    }

    pub fn get_entry(&self, key: &QueryKey) -> Option<CachedData<V>> {
        self.read().get(key).cloned()
    }

    /// Replace the value under `key` with `f(current)`.
    ///
    /// Does nothing and returns `false` when the entry is absent.
    pub fn update(&self, key: &QueryKey, f: impl FnOnce(&V) -> V) -> bool {
        let mut entries = self.write();
        let Some(current) = entries.get(key) else {
            return false;
        };
        let next = f(&current.data);
        entries.insert(key.clone(), CachedData::new(next));
        drop(entries);

        self.notify(key, CacheEventKind::Set);
        true
    }

    /// Atomically read the entry under `key` and replace its value with
    /// `f(current)`.
    ///
    /// Returns the entry as it was before the call and whether a write
    /// happened. When `f` returns `None` the entry is left as is.
    pub fn replace_with(
        &self,
        key: &QueryKey,
        f: impl FnOnce(Option<&V>) -> Option<V>,
    ) -> (Option<CachedData<V>>, bool) {
        let mut entries = self.write();
        let previous = entries.get(key).cloned();
        let Some(next) = f(previous.as_ref().map(|entry| &entry.data)) else {
            return (previous, false);
        };
        entries.insert(key.clone(), CachedData::new(next));
        drop(entries);

        self.notify(key, CacheEventKind::Set);
        (previous, true)
    }

    /// Return the cached value if it is still fresh, otherwise await
    /// `fetcher` and cache its result.
    ///
    /// A failed fetch leaves the cache untouched.
    pub async fn fetch_query<F, Fut>(
        &self,
        key: &QueryKey,
        stale_time: StaleTime,
        fetcher: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(entry) = self.get_entry(key) {
            if !entry.is_stale(stale_time) {
                debug!(key = %key, age = %entry.age_display(), "Serving query from cache");
                return Ok(entry.data);
            }
        }

        debug!(key = %key, "Fetching query");
        let value = fetcher().await?;
        self.set(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn key() -> QueryKey {
        QueryKey::new("test")
    }

    #[test]
    fn test_set_get_remove() {
        let cache = CacheManager::new();
        assert!(cache.get(&key()).is_none());
        assert!(!cache.contains(&key()));

        assert!(cache.set(&key(), 1).is_none());
        let previous = cache.set(&key(), 2).expect("previous entry");
        assert_eq!(previous.data, 1);
        assert_eq!(cache.get(&key()), Some(2));

        assert_eq!(cache.remove(&key()).map(|e| e.data), Some(2));
        assert!(cache.remove(&key()).is_none());
    }

    #[test]
    fn test_clones_share_the_table() {
        let cache = CacheManager::new();
        let reader = cache.clone();
        cache.set(&key(), "value".to_string());
        assert_eq!(reader.get(&key()).as_deref(), Some("value"));
    }

    #[test]
    fn test_update_is_noop_when_absent() {
        let cache: CacheManager<i32> = CacheManager::new();
        assert!(!cache.update(&key(), |v| v + 1));
        assert!(!cache.contains(&key()));

        cache.set(&key(), 41);
        assert!(cache.update(&key(), |v| v + 1));
        assert_eq!(cache.get(&key()), Some(42));
    }

    #[test]
    fn test_replace_with_returns_previous_entry() {
        let cache = CacheManager::new();
        let (previous, written) = cache.replace_with(&key(), |current| {
            assert!(current.is_none());
            Some(1)
        });
        assert!(previous.is_none());
        assert!(written);

        let (previous, written) = cache.replace_with(&key(), |_| None);
        assert_eq!(previous.map(|e| e.data), Some(1));
        assert!(!written);
        assert_eq!(cache.get(&key()), Some(1));
    }

    #[test]
    fn test_put_entry_keeps_timestamp() {
        let cache = CacheManager::new();
        let mut entry = CachedData::new(7);
        entry.cached_at = Utc::now() - Duration::minutes(90);
        cache.put_entry(&key(), entry.clone());

        assert_eq!(cache.get_entry(&key()), Some(entry));
        assert!(cache.is_stale(&key(), StaleTime::Minutes(60)));
        assert!(!cache.is_stale(&key(), StaleTime::Infinite));
    }

    #[test]
    fn test_subscribers_observe_writes() {
        let cache = CacheManager::new();
        let mut events = cache.subscribe();

        cache.set(&key(), 1);
        cache.remove(&key());
        cache.remove(&key()); // absent, no event

        assert_eq!(
            events.try_recv().expect("set event"),
            CacheEvent {
                key: key(),
                kind: CacheEventKind::Set,
            }
        );
        assert_eq!(
            events.try_recv().expect("remove event"),
            CacheEvent {
                key: key(),
                kind: CacheEventKind::Removed,
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fetch_query_uses_fresh_cache() {
        let cache = CacheManager::new();
        cache.set(&key(), 1);

        let value = cache
            .fetch_query(&key(), StaleTime::Infinite, || async { Ok(99) })
            .await
            .expect("cached value");
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_fetch_query_fetches_when_absent_or_stale() {
        let cache = CacheManager::new();
        let value = cache
            .fetch_query(&key(), StaleTime::Infinite, || async { Ok(5) })
            .await
            .expect("fetched value");
        assert_eq!(value, 5);
        assert_eq!(cache.get(&key()), Some(5));

        let value = cache
            .fetch_query(&key(), StaleTime::Minutes(-1), || async { Ok(6) })
            .await
            .expect("refetched value");
        assert_eq!(value, 6);
    }

    #[tokio::test]
    async fn test_fetch_query_failure_leaves_cache_untouched() {
        let cache = CacheManager::new();
        let result = cache
            .fetch_query(&key(), StaleTime::Infinite, || async {
                Err::<i32, _>(anyhow::anyhow!("offline"))
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains(&key()));
    }
}
