use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    CacheError,
    cache::{AtomicCache, CacheFactory, CacheHandle},
    mutex::Mutex,
};

/// Lifetime given to counters that [`AtomicCache::increment`] creates on a
/// missing or expired key.
pub const DEFAULT_INCREMENT_TTL: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct Counter {
    value: i64,
    /// `None` only when the deadline overflows `Instant`.
    expires_at: Option<Instant>,
}

impl Counter {
    fn new(value: i64, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// An in-process [`AtomicCache`] with per-key expiry.
///
/// Expired keys are dropped lazily, when touched or on the next insert.
/// Every key expires: counters created by [`AtomicCache::increment`] on a
/// missing key live for the cache's increment TTL.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Counter>>,
    increment_ttl: Duration,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_increment_ttl(DEFAULT_INCREMENT_TTL)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache whose increment-created counters live for `ttl`.
    pub fn with_increment_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            increment_ttl: ttl,
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .values()
            .filter(|counter| counter.is_live(now))
            .count())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        self.len().map(|len| len == 0)
    }

    fn lock(&self) -> Result<crate::mutex::MutexGuard<'_, HashMap<String, Counter>>, CacheError> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.entries.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            self.entries
                .lock()
                .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".into()))
        }
    }
}

impl AtomicCache for MemoryCache {
    fn add(&self, key: &str, value: i64, ttl: Duration) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        entries.retain(|_, counter| counter.is_live(now));
        match entries.entry(key.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Counter::new(value, now, ttl));
                Ok(true)
            }
        }
    }

    fn increment(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let counter = entries
            .entry(key.to_owned())
            .or_insert_with(|| Counter::new(0, now, self.increment_ttl));
        if !counter.is_live(now) {
            *counter = Counter::new(0, now, self.increment_ttl);
        }
        let current = counter.value;
        counter.value = current
            .checked_add(delta)
            .ok_or_else(|| CacheError::Inconsistent {
                key: key.to_owned(),
                value: current,
            })?;
        Ok(counter.value)
    }
}

/// Hands out [`MemoryCache`]s, one per namespace, shared by every caller
/// asking for the same namespace.
#[derive(Debug, Default)]
pub struct MemoryCacheFactory {
    caches: Mutex<HashMap<String, Arc<MemoryCache>>>,
}

impl CacheFactory for MemoryCacheFactory {
    fn create(&self, namespace: &str) -> CacheHandle {
        #[cfg(feature = "parking-lot")]
        let mut caches = self.caches.lock();
        #[cfg(not(feature = "parking-lot"))]
        let Ok(mut caches) = self.caches.lock() else {
            return CacheHandle::NonAtomic;
        };
        let cache = caches.entry(namespace.to_owned()).or_default();
        CacheHandle::Atomic(Arc::clone(cache) as Arc<dyn AtomicCache>)
    }
}
