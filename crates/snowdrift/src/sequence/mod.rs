mod cache;
mod interface;
mod local;

pub use cache::*;
pub use interface::*;
pub use local::*;

use std::time::Duration;

use crate::{RandSource, ThreadRandom, cache::CacheHandle, error::Result};

/// The resolver a generator actually uses, picked once from the
/// [`CacheHandle`] its cache factory returned.
#[derive(Debug)]
pub enum SequenceSource<R = ThreadRandom> {
    Cache(CacheBackedResolver),
    Local(LocalFallbackResolver<R>),
}

impl SequenceSource {
    /// Uses the cache if it is atomic, the local fallback otherwise.
    pub fn from_handle(handle: CacheHandle, max_sequence: u64, ttl: Duration) -> Self {
        match handle {
            CacheHandle::Atomic(cache) => Self::Cache(CacheBackedResolver::with_ttl(cache, ttl)),
            CacheHandle::NonAtomic => {
                #[cfg(feature = "tracing")]
                tracing::debug!(max_sequence, "no atomic cache, using local sequence fallback");
                Self::Local(LocalFallbackResolver::new(max_sequence))
            }
        }
    }
}

impl<R> SequenceResolver for SequenceSource<R>
where
    R: RandSource<u64>,
{
    fn is_available(&self) -> bool {
        match self {
            Self::Cache(resolver) => resolver.is_available(),
            Self::Local(resolver) => resolver.is_available(),
        }
    }

    fn sequence(&self, timestamp: u64) -> Result<u64> {
        match self {
            Self::Cache(resolver) => resolver.sequence(timestamp),
            Self::Local(resolver) => resolver.sequence(timestamp),
        }
    }
}
