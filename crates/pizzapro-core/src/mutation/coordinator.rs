use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::cache::{CacheManager, CachedData, QueryKey};

/// A change that can be applied to a cached value.
///
/// `apply` computes the speculative value from the current one. Returning
/// `None` means the change can't be applied (e.g. a partial update against
/// an entry that was never loaded) and the cache is left alone.
pub trait Patch<V> {
    fn apply(&self, current: Option<&V>) -> Option<V>;
}

/// A complete value replaces whatever is cached.
impl<V: Clone> Patch<V> for V {
    fn apply(&self, _current: Option<&V>) -> Option<V> {
        Some(self.clone())
    }
}

/// The cache entry as it was before a speculative write.
///
/// Owned by the single in-flight mutation and consumed when it settles.
#[derive(Debug)]
#[must_use = "a snapshot must be committed or rolled back"]
pub struct Snapshot<V> {
    key: QueryKey,
    previous: Option<CachedData<V>>,
    applied: bool,
}

impl<V> Snapshot<V> {
    /// The value cached before the mutation began, if any.
    pub fn previous(&self) -> Option<&V> {
        self.previous.as_ref().map(|entry| &entry.data)
    }

    pub fn was_absent(&self) -> bool {
        self.previous.is_none()
    }

    /// Whether a speculative value was written.
    pub fn applied(&self) -> bool {
        self.applied
    }
}

/// Applies speculative writes to a `CacheManager` and undoes them when the
/// matching remote write fails.
pub struct MutationCoordinator<V> {
    cache: CacheManager<V>,
    in_flight: Arc<Mutex<HashMap<QueryKey, usize>>>,
}

impl<V> Clone for MutationCoordinator<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<V: Clone> MutationCoordinator<V> {
    pub fn new(cache: CacheManager<V>) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &CacheManager<V> {
        &self.cache
    }

    /// Whether a mutation for `key` has begun and not yet settled.
    pub fn is_mutating(&self, key: &QueryKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of mutations that have begun and not yet settled.
    pub fn pending_mutations(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    fn track(&self, key: &QueryKey) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let count = in_flight.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            warn!(key = %key, pending = *count, "Concurrent mutations for the same key");
        }
    }

    fn untrack(&self, key: &QueryKey) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = in_flight.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(key);
            }
        }
    }

    /// Snapshot the entry for `key` and write the speculative value.
    ///
    /// Readers observe the new value as soon as this returns. The returned
    /// snapshot must be passed to `commit_mutation` or `rollback_mutation`.
    pub fn begin_mutation<P>(&self, key: &QueryKey, patch: &P) -> Snapshot<V>
    where
        P: Patch<V> + ?Sized,
    {
        let (previous, applied) = self.cache.replace_with(key, |current| patch.apply(current));
        self.track(key);

        if applied {
            debug!(key = %key, had_previous = previous.is_some(), "Speculative write applied");
        } else {
            debug!(key = %key, "Nothing cached to patch, speculative write skipped");
        }

        Snapshot {
            key: key.clone(),
            previous,
            applied,
        }
    }

    /// Settle a successful mutation. The speculative value is already what
    /// the remote holds, so the cache is not touched.
    pub fn commit_mutation(&self, snapshot: Snapshot<V>) {
        debug!(key = %snapshot.key, "Mutation committed");
        self.untrack(&snapshot.key);
    }

    /// Settle a failed mutation by restoring the snapshot.
    ///
    /// A snapshot taken while the entry was absent removes the speculative
    /// value, so the entry reads as "not yet loaded" again.
    pub fn rollback_mutation(&self, snapshot: Snapshot<V>) {
        let Snapshot {
            key,
            previous,
            applied,
        } = snapshot;
        self.untrack(&key);

        if !applied {
            debug!(key = %key, "Nothing to roll back");
            return;
        }

        match previous {
            Some(entry) => {
                self.cache.put_entry(&key, entry);
                info!(key = %key, "Mutation rolled back to previous value");
            }
            None => {
                self.cache.remove(&key);
                info!(key = %key, "Mutation rolled back, entry was not loaded");
            }
        }
    }

    /// Run an optimistic mutation around `remote`.
    ///
    /// The speculative value is written before `remote` is called. When the
    /// returned future resolves the mutation is committed on `Ok` and rolled
    /// back on `Err`; the remote's result is returned unchanged. Dropping
    /// the future before it resolves also rolls back.
    pub async fn mutate<P, F, Fut, T, E>(
        &self,
        key: &QueryKey,
        patch: &P,
        remote: F,
    ) -> Result<T, E>
    where
        P: Patch<V> + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let pending = PendingMutation {
            coordinator: self,
            snapshot: Some(self.begin_mutation(key, patch)),
        };

        let outcome = remote().await;
        match &outcome {
            Ok(_) => pending.commit(),
            Err(e) => {
                warn!(key = %key, error = %e, "Remote write failed");
                pending.rollback();
            }
        }
        outcome
    }
}

/// Rolls the mutation back if dropped before it settles.
struct PendingMutation<'a, V: Clone> {
    coordinator: &'a MutationCoordinator<V>,
    snapshot: Option<Snapshot<V>>,
}

impl<V: Clone> PendingMutation<'_, V> {
    fn commit(mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.coordinator.commit_mutation(snapshot);
        }
    }

    fn rollback(mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.coordinator.rollback_mutation(snapshot);
        }
    }
}

impl<V: Clone> Drop for PendingMutation<'_, V> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            warn!(key = %snapshot.key, "Mutation dropped before settlement");
            self.coordinator.rollback_mutation(snapshot);
        }
    }
}
