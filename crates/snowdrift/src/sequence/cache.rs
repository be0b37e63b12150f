use std::{fmt, sync::Arc, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    cache::AtomicCache,
    error::{CacheError, Error, Result},
    sequence::SequenceResolver,
};

/// Default lifetime of a per-millisecond counter in the shared cache.
pub const DEFAULT_SEQUENCE_TTL: Duration = Duration::from_millis(50);

/// Resolves sequences through atomic counters in a shared cache, keyed by the
/// decimal millisecond.
///
/// The first caller of a millisecond creates the key with value `1` and gets
/// `0`. Every later caller increments the key and gets the new value, so the
/// second caller of a millisecond gets `2`.
#[derive(Clone)]
pub struct CacheBackedResolver {
    cache: Arc<dyn AtomicCache>,
    ttl: Duration,
}

impl CacheBackedResolver {
    pub fn new(cache: Arc<dyn AtomicCache>) -> Self {
        Self::with_ttl(cache, DEFAULT_SEQUENCE_TTL)
    }

    pub fn with_ttl(cache: Arc<dyn AtomicCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn resolve(&self, key: &str) -> Result<u64, CacheError> {
        if self.cache.add(key, 1, self.ttl)? {
            return Ok(0);
        }
        let value = self.cache.increment(key, 1)?;
        match u64::try_from(value) {
            Ok(sequence) if sequence > 0 => Ok(sequence),
            _ => Err(CacheError::Inconsistent {
                key: key.to_owned(),
                value,
            }),
        }
    }
}

impl SequenceResolver for CacheBackedResolver {
    fn is_available(&self) -> bool {
        true
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn sequence(&self, timestamp: u64) -> Result<u64> {
        self.resolve(&timestamp.to_string())
            .map_err(|source| Error::SequenceResolution { timestamp, source })
    }
}

impl fmt::Debug for CacheBackedResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBackedResolver")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
