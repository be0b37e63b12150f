use std::{fmt, sync::Arc, time::Duration};

use crate::error::CacheError;

/// A shared cache that supports atomic counters.
///
/// Both operations must be atomic with respect to every other caller of the
/// same cache, across processes and hosts if the cache is distributed.
pub trait AtomicCache: Send + Sync {
    /// Stores `value` under `key` for `ttl` unless the key already exists.
    ///
    /// Returns `true` iff the key was absent and is now set.
    fn add(&self, key: &str, value: i64, ttl: Duration) -> Result<bool, CacheError>;

    /// Adds `delta` to the counter at `key` and returns the new value.
    fn increment(&self, key: &str, delta: i64) -> Result<i64, CacheError>;
}

impl<C: AtomicCache + ?Sized> AtomicCache for Arc<C> {
    fn add(&self, key: &str, value: i64, ttl: Duration) -> Result<bool, CacheError> {
        (**self).add(key, value, ttl)
    }

    fn increment(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        (**self).increment(key, delta)
    }
}

/// What a [`CacheFactory`] could provide, decided once per generator.
#[derive(Clone)]
pub enum CacheHandle {
    /// A cache with atomic add and increment.
    Atomic(Arc<dyn AtomicCache>),
    /// No cache, or one without atomic counters.
    NonAtomic,
}

impl CacheHandle {
    pub fn atomic(cache: impl AtomicCache + 'static) -> Self {
        Self::Atomic(Arc::new(cache))
    }

    pub const fn is_atomic(&self) -> bool {
        matches!(self, Self::Atomic(_))
    }
}

impl fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic(_) => f.write_str("CacheHandle::Atomic(..)"),
            Self::NonAtomic => f.write_str("CacheHandle::NonAtomic"),
        }
    }
}

/// Hands out cache handles by namespace.
pub trait CacheFactory {
    fn create(&self, namespace: &str) -> CacheHandle;
}

impl<F: CacheFactory + ?Sized> CacheFactory for &F {
    fn create(&self, namespace: &str) -> CacheHandle {
        (**self).create(namespace)
    }
}

/// A factory that never has an atomic cache. Generators built from it use
/// the local fallback resolver.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl CacheFactory for NoCache {
    fn create(&self, _namespace: &str) -> CacheHandle {
        CacheHandle::NonAtomic
    }
}
