use crate::error::Result;

/// Hands out per-millisecond sequence numbers.
///
/// `0` denotes the first caller in a millisecond. A value above the layout's
/// maximum sequence means the millisecond is exhausted; the generator then
/// backs off and asks again with a fresh clock read.
pub trait SequenceResolver {
    /// Whether this resolver coordinates through a shared atomic cache.
    fn is_available(&self) -> bool;

    /// Returns the sequence number for Unix millisecond `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequenceResolution`](crate::Error::SequenceResolution)
    /// if the shared cache faults. Local state only fails on a poisoned lock.
    fn sequence(&self, timestamp: u64) -> Result<u64>;
}

impl<S: SequenceResolver + ?Sized> SequenceResolver for &S {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn sequence(&self, timestamp: u64) -> Result<u64> {
        (**self).sequence(timestamp)
    }
}
