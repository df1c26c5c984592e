//! Bounded cache with strict LRU eviction and lazy TTL expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use fathom_core::clock::{Clock, SystemClock};
use fathom_core::config::CacheConfig;
use fathom_core::types::{CacheKey, FusionResult};

use crate::similarity::cosine_similarity;

/// Immutable published cache value. Cloning is a pointer copy.
pub type CachedValue = Arc<[FusionResult]>;

struct CacheEntry {
    value: CachedValue,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    /// Monotonic access tick; the smallest tick is the LRU entry.
    last_tick: u64,
    embedding: Option<Vec<f32>>,
}

struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    tick: u64,
}

/// Key/value store with TTL plus capacity (LRU) eviction and an optional
/// similarity-lookup mode.
///
/// Shared across all concurrent requests. All state lives under one mutex;
/// the lock is never held across I/O. Writes are last-write-wins by key.
pub struct CacheStore {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<CacheInner>,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Store with an injected clock, for deterministic TTL tests.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                tick: 0,
            }),
        }
    }

    /// Exact-key lookup. An expired entry is removed and reported as a miss
    /// even if it is the most recently used; a hit refreshes recency.
    pub fn get_exact(&self, key: &CacheKey) -> Option<CachedValue> {
        let now = self.clock.now();
        let mut inner = self.lock();

        let expired = inner
            .entries
            .get(key)
            .is_some_and(|e| self.is_expired(e, now));
        if expired {
            inner.entries.remove(key);
            return None;
        }

        let tick = Self::next_tick(&mut inner);
        let entry = inner.entries.get_mut(key)?;
        entry.last_accessed_at = now;
        entry.last_tick = tick;
        Some(Arc::clone(&entry.value))
    }

    /// Similarity lookup over entries that carry a query embedding.
    ///
    /// Returns the single highest-similarity unexpired entry with
    /// `cosine >= threshold`; anything below threshold is a miss, never a
    /// best-effort match.
    pub fn get_similar(&self, embedding: &[f32], threshold: f64) -> Option<CachedValue> {
        let now = self.clock.now();
        let mut inner = self.lock();

        let mut best: Option<(CacheKey, f64)> = None;
        for (key, entry) in &inner.entries {
            if self.is_expired(entry, now) {
                continue;
            }
            let Some(stored) = &entry.embedding else {
                continue;
            };
            let sim = cosine_similarity(embedding, stored);
            if sim >= threshold && best.as_ref().map_or(true, |(_, b)| sim > *b) {
                best = Some((key.clone(), sim));
            }
        }

        let (key, sim) = best?;
        debug!(similarity = sim, "similarity cache hit");
        let tick = Self::next_tick(&mut inner);
        let entry = inner.entries.get_mut(&key)?;
        entry.last_accessed_at = now;
        entry.last_tick = tick;
        Some(Arc::clone(&entry.value))
    }

    /// Publish a value. The slice is deep-copied into a fresh immutable
    /// allocation; the caller keeps no handle into the stored entry.
    ///
    /// At capacity, TTL-expired entries are evicted first, then the strict
    /// least-recently-used entry. Re-putting an existing key replaces the
    /// value and restarts its TTL (last-write-wins).
    pub fn put(&self, key: CacheKey, value: &[FusionResult], embedding: Option<Vec<f32>>) {
        let now = self.clock.now();
        let mut inner = self.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.capacity {
            self.evict_one(&mut inner, now);
        }

        let tick = Self::next_tick(&mut inner);
        inner.entries.insert(
            key,
            CacheEntry {
                value: Arc::from(value.to_vec().into_boxed_slice()),
                created_at: now,
                last_accessed_at: now,
                last_tick: tick,
                embedding,
            },
        );
    }

    /// Remove every TTL-expired entry. Intended for a background sweep.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        let ttl = self.ttl();
        inner
            .entries
            .retain(|_, e| now - e.created_at <= ttl);
        before - inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn evict_one(&self, inner: &mut CacheInner, now: DateTime<Utc>) {
        // TTL expiry takes precedence: stale-but-recently-used entries go
        // before any live entry is considered.
        let expired: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, e)| self.is_expired(e, now))
            .map(|(k, _)| k.clone())
            .collect();
        if !expired.is_empty() {
            for key in expired {
                inner.entries.remove(&key);
            }
            return;
        }

        let lru = inner
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_tick)
            .map(|(k, _)| k.clone());
        if let Some(key) = lru {
            debug!(key = %key, "evicting least-recently-used cache entry");
            inner.entries.remove(&key);
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at > self.ttl()
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(self.config.ttl_secs as i64)
    }

    fn next_tick(inner: &mut CacheInner) -> u64 {
        inner.tick += 1;
        inner.tick
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
