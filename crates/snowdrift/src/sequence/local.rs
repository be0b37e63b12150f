#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    RandSource, ThreadRandom,
    error::Result,
    identity::crc32,
    mutex::{Mutex, lock},
    sequence::SequenceResolver,
};

#[derive(Debug, Default)]
struct State {
    last_timestamp: Option<u64>,
    counter: u64,
}

/// Resolves sequences from an in-process counter when no shared cache is
/// available.
///
/// Within one millisecond the counter increments. On a new millisecond it is
/// reseeded to `crc32(nonce) % max_sequence` from a fresh random nonce, which
/// keeps collisions between processes that start in the same millisecond
/// unlikely, though not impossible.
#[derive(Debug)]
pub struct LocalFallbackResolver<R = ThreadRandom> {
    state: Mutex<State>,
    max_sequence: u64,
    rng: R,
}

impl LocalFallbackResolver {
    pub fn new(max_sequence: u64) -> Self {
        Self::with_rng(max_sequence, ThreadRandom)
    }
}

impl<R> LocalFallbackResolver<R>
where
    R: RandSource<u64>,
{
    pub fn with_rng(max_sequence: u64, rng: R) -> Self {
        Self {
            state: Mutex::new(State::default()),
            max_sequence,
            rng,
        }
    }

    fn reseed(&self) -> u64 {
        let nonce = self.rng.rand();
        u64::from(crc32(&nonce.to_le_bytes())) % self.max_sequence.max(1)
    }
}

impl<R> SequenceResolver for LocalFallbackResolver<R>
where
    R: RandSource<u64>,
{
    fn is_available(&self) -> bool {
        false
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn sequence(&self, timestamp: u64) -> Result<u64> {
        let mut state = lock(&self.state)?;
        if state.last_timestamp == Some(timestamp) {
            state.counter = state.counter.saturating_add(1);
        } else {
            state.last_timestamp = Some(timestamp);
            state.counter = self.reseed();
        }
        Ok(state.counter)
    }
}
