//! Cache Store Module
//!
//! Generic, sharded, size-bounded TTL cache with atomic read-modify-write
//! transactions and memoized computation.
//!
//! Keys are hashed onto a fixed set of shards, each guarded by its own mutex.
//! Every operation on a key holds only that key's shard lock, so closures
//! passed to [`BoundedTtlCache::mutate`] and [`BoundedTtlCache::provide`] run
//! atomically with respect to the key without blocking unrelated shards.
//! Pruning runs under a separate lock taken with `try_lock`.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::lru::LruCandidates;
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats, SHARD_COUNT};
use crate::clock::{Clock, SystemClock};

type Entries<T> = HashMap<String, CacheEntry<T>>;

// == Bounded TTL Cache ==
/// Thread-safe key/value cache bounded by item count, with per-entry TTL.
///
/// Once more than `max_size` entries are present, the cache prunes expired
/// entries first and then roughly `prune_batch_size` of the least recently
/// touched ones. Ordering is approximate.
///
/// Closures handed to [`mutate`](Self::mutate), [`update`](Self::update),
/// [`provide`](Self::provide) and [`try_provide`](Self::try_provide) run while
/// the key's shard is locked. They must be quick, must not block and must not
/// call back into the same cache.
pub struct BoundedTtlCache<T, C: Clock = SystemClock> {
    shards: Box<[Mutex<Entries<T>>]>,
    hasher: RandomState,
    /// Physically present entries across all shards
    len: AtomicUsize,
    /// Recency counter handed out to entries on write and hit
    tick: AtomicU64,
    prune_lock: Mutex<()>,
    stats: StatsRecorder,
    max_size: usize,
    prune_batch_size: usize,
    default_ttl: Duration,
    not_found_ttl: Option<Duration>,
    clock: C,
}

impl<T> BoundedTtlCache<T, SystemClock> {
    // == Constructor ==
    /// Creates a cache backed by the system clock.
    ///
    /// # Arguments
    /// * `max_size` - Entry count above which pruning kicks in
    /// * `prune_batch_size` - Approximate number of entries removed per prune
    /// * `default_ttl` - TTL used by [`set`](Self::set) and [`mutate`](Self::mutate)
    pub fn new(max_size: usize, prune_batch_size: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_size, prune_batch_size, default_ttl, SystemClock)
    }
}

impl<T, C: Clock> BoundedTtlCache<T, C> {
    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(
        max_size: usize,
        prune_batch_size: usize,
        default_ttl: Duration,
        clock: C,
    ) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher: RandomState::new(),
            len: AtomicUsize::new(0),
            tick: AtomicU64::new(0),
            prune_lock: Mutex::new(()),
            stats: StatsRecorder::default(),
            max_size,
            prune_batch_size,
            default_ttl,
            not_found_ttl: None,
            clock,
        }
    }

    /// Enables negative caching: zero-valued results of
    /// [`provide`](Self::provide) are cached for `ttl`.
    pub fn with_not_found_ttl(mut self, ttl: Duration) -> Self {
        self.not_found_ttl = Some(ttl);
        self
    }

    // == Set ==
    /// Stores `value` with the default TTL, replacing any existing entry.
    pub fn set(&self, key: &str, value: T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Stores `value` with an explicit TTL, replacing any existing entry.
    pub fn set_with_ttl(&self, key: &str, value: T, ttl: Duration) {
        let now = self.clock.now();
        {
            let mut entries = self.shard(key).lock();
            self.insert_locked(&mut entries, key, value, ttl, now);
        }
        self.maybe_prune();
    }

    // == Contains ==
    /// Returns true if a live entry exists for `key`.
    ///
    /// Does not count as a use for eviction purposes.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        let entries = self.shard(key).lock();
        let found = matches!(entries.get(key), Some(entry) if !entry.is_expired(now));
        self.stats.record_lookup(found);
        found
    }

    // == Delete ==
    /// Removes the entry for `key`. Missing keys are ignored.
    pub fn delete(&self, key: &str) {
        let removed = self.shard(key).lock().remove(key);
        if removed.is_some() {
            self.len.fetch_sub(1, Ordering::Relaxed);
        }
    }

    // == Expire ==
    /// Forces a live entry to expire immediately without removing it.
    ///
    /// Returns false if there is no live entry for `key`. The expiry is set
    /// to the earlier of now and the current expiry, so an entry that already
    /// expired on its own stays expired.
    pub fn expire(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.shard(key).lock();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expire(now);
                true
            }
            _ => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let removed = self.remove_expired(self.clock.now());
        if removed > 0 {
            debug!(removed, "removed expired cache entries");
        }
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            let mut entries = shard.lock();
            self.len.fetch_sub(entries.len(), Ordering::Relaxed);
            entries.clear();
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of physically present entries, including expired
    /// entries that have not been removed yet.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured default TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Internals ==
    fn shard(&self, key: &str) -> &Mutex<Entries<T>> {
        let index = (self.hasher.hash_one(key) as usize) % self.shards.len();
        &self.shards[index]
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    fn insert_locked(
        &self,
        entries: &mut Entries<T>,
        key: &str,
        value: T,
        ttl: Duration,
        now: Instant,
    ) {
        let entry = CacheEntry::new(value, now, ttl, self.next_tick());
        match entries.get_mut(key) {
            Some(existing) => *existing = entry,
            None => {
                entries.insert(key.to_string(), entry);
                self.len.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Removes `key` from a locked shard and returns its value if it was live.
    fn take_locked(&self, entries: &mut Entries<T>, key: &str, now: Instant) -> Option<T> {
        let entry = entries.remove(key)?;
        self.len.fetch_sub(1, Ordering::Relaxed);
        if entry.is_expired(now) {
            self.stats.record_expirations(1);
            None
        } else {
            Some(entry.value)
        }
    }

    /// Runs a transaction on one key while its shard is locked.
    ///
    /// `f` receives the live value (if any) and returns the value to store,
    /// or `None` to leave the key absent, together with a result for the
    /// caller. Stored values get the default TTL. Counts as a lookup.
    fn transact<R, F>(&self, key: &str, f: F) -> R
    where
        F: FnOnce(Option<T>) -> (Option<T>, R),
    {
        let now = self.clock.now();
        let result = {
            let mut entries = self.shard(key).lock();
            let current = self.take_locked(&mut entries, key, now);
            self.stats.record_lookup(current.is_some());
            let (next, result) = f(current);
            if let Some(value) = next {
                self.insert_locked(&mut entries, key, value, self.default_ttl, now);
            }
            result
        };
        self.maybe_prune();
        result
    }

    fn remove_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut entries = shard.lock();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            removed += before - entries.len();
        }

        if removed > 0 {
            self.len.fetch_sub(removed, Ordering::Relaxed);
            self.stats.record_expirations(removed);
        }
        removed
    }

    fn maybe_prune(&self) {
        if self.len() <= self.max_size {
            return;
        }

        // Another caller is already pruning.
        let Some(_guard) = self.prune_lock.try_lock() else {
            return;
        };

        if self.len() > self.max_size {
            self.prune();
        }
    }

    /// Drops expired entries, then evicts the least recently touched ones
    /// until roughly `prune_batch_size` entries (and at least the excess over
    /// `max_size`) are gone.
    fn prune(&self) {
        let excess = self.len().saturating_sub(self.max_size);
        let target = self.prune_batch_size.max(excess);

        let expired = self.remove_expired(self.clock.now());
        let remaining = target.saturating_sub(expired);
        if remaining == 0 {
            debug!(expired, evicted = 0, "pruned cache");
            return;
        }

        let mut candidates = LruCandidates::new(remaining);
        for (index, shard) in self.shards.iter().enumerate() {
            let entries = shard.lock();
            for (key, entry) in entries.iter() {
                candidates.offer(entry.touched, index, key);
            }
        }
        if candidates.is_empty() {
            debug!(expired, evicted = 0, "pruned cache");
            return;
        }

        let mut victims = candidates.into_victims();
        victims.sort_by_key(|victim| victim.shard);

        let mut evicted = 0;
        for group in victims.chunk_by(|a, b| a.shard == b.shard) {
            let mut entries = self.shards[group[0].shard].lock();
            for victim in group {
                // Skip entries that were written or read since collection.
                let untouched = matches!(
                    entries.get(&victim.key),
                    Some(entry) if entry.touched == victim.touched
                );
                if untouched {
                    entries.remove(&victim.key);
                    evicted += 1;
                }
            }
        }

        self.len.fetch_sub(evicted, Ordering::Relaxed);
        self.stats.record_evictions(evicted);
        debug!(expired, evicted, "pruned cache");
    }
}

impl<T: Clone, C: Clock> BoundedTtlCache<T, C> {
    // == Get ==
    /// Returns a copy of the live value for `key`.
    ///
    /// Expired entries are removed on access and reported as missing.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.shard(key).lock();
        let value = self.lookup_locked(&mut entries, key, now);
        self.stats.record_lookup(value.is_some());
        value
    }

    // == Mutate ==
    /// Atomically replaces the value for `key` with `f(current)`.
    ///
    /// `current` is `None` when the key is absent or expired. The result is
    /// stored with the default TTL and returned. Concurrent calls on the same
    /// key are serialized, so no update is lost.
    pub fn mutate<F>(&self, key: &str, f: F) -> T
    where
        F: FnOnce(Option<T>) -> T,
    {
        self.transact(key, |current| {
            let value = f(current);
            (Some(value.clone()), value)
        })
    }

    /// Atomically replaces the value for `key` with `f(current)`, removing
    /// the key when `f` returns `None`.
    ///
    /// Returns what `f` returned.
    pub fn update<F>(&self, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(Option<T>) -> Option<T>,
    {
        self.transact(key, |current| {
            let next = f(current);
            (next.clone(), next)
        })
    }

    fn lookup_locked(&self, entries: &mut Entries<T>, key: &str, now: Instant) -> Option<T> {
        let entry = entries.get_mut(key)?;
        if !entry.is_expired(now) {
            entry.touched = self.next_tick();
            return Some(entry.value.clone());
        }

        entries.remove(key);
        self.len.fetch_sub(1, Ordering::Relaxed);
        self.stats.record_expirations(1);
        None
    }
}

impl<T: Clone + Default + PartialEq, C: Clock> BoundedTtlCache<T, C> {
    // == Provide ==
    /// Returns the cached value for `key`, computing it with `f` on a miss.
    ///
    /// A computed value equal to `T::default()` is only cached when a
    /// not-found TTL was configured, and then with that TTL. Any other value
    /// is cached with the default TTL.
    pub fn provide<F>(&self, key: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self.try_provide(key, || Ok::<T, std::convert::Infallible>(f())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`provide`](Self::provide), but `f` may fail.
    ///
    /// Errors are returned to the caller and nothing is cached, so the next
    /// call invokes `f` again.
    pub fn try_provide<E, F>(&self, key: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let now = self.clock.now();
        let value = {
            let mut entries = self.shard(key).lock();
            if let Some(value) = self.lookup_locked(&mut entries, key, now) {
                self.stats.record_hit();
                return Ok(value);
            }
            self.stats.record_miss();

            let value = f()?;
            let ttl = if value == T::default() {
                self.not_found_ttl
            } else {
                Some(self.default_ttl)
            };
            if let Some(ttl) = ttl {
                self.insert_locked(&mut entries, key, value.clone(), ttl, now);
            }
            value
        };
        self.maybe_prune();
        Ok(value)
    }
}

impl<T, C: Clock> fmt::Debug for BoundedTtlCache<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedTtlCache")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .field("prune_batch_size", &self.prune_batch_size)
            .field("default_ttl", &self.default_ttl)
            .field("not_found_ttl", &self.not_found_ttl)
            .finish()
    }
}
