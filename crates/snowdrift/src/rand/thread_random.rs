use ::rand::{Rng, rng};

use crate::RandSource;

/// A `RandSource` backed by the thread-local RNG.
///
/// Zero-sized: it does not store the RNG and may be shared across threads.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource<u32> for ThreadRandom {
    fn rand(&self) -> u32 {
        rng().random()
    }
}

impl RandSource<u64> for ThreadRandom {
    fn rand(&self) -> u64 {
        rng().random()
    }
}
