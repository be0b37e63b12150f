use crate::id::Field;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `snowdrift` can produce.
///
/// Sequence exhaustion is deliberately absent: running out of sequence
/// numbers inside a millisecond is handled by the generator's backoff loop and
/// never surfaces to callers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The generator could not be constructed (or the clock fell behind the
    /// epoch). Fatal: the configuration has to be fixed.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The shared cache was expected to hand out a sequence number but
    /// faulted. The generator does not retry these.
    #[error("failed to resolve sequence for millisecond {timestamp}")]
    SequenceResolution {
        /// Unix millisecond the sequence was requested for.
        timestamp: u64,
        #[source]
        source: CacheError,
    },

    /// The input is not a non-negative integer numeral that fits in 63 bits.
    #[error("malformed identifier {input:?}: {reason}")]
    MalformedIdentifier {
        input: String,
        reason: &'static str,
    },

    /// The narrow-integer backend was selected but no arbitrary precision
    /// arithmetic was compiled in (feature `decimal`).
    #[error("platform lacks required capability: {capability}")]
    PlatformCapability { capability: &'static str },

    /// A lock was poisoned by a panicking thread.
    ///
    /// Only present with std mutexes; `parking_lot` mutexes do not poison.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("lock poisoned")]
    LockPoisoned,
}

impl Error {
    pub(crate) fn malformed(input: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedIdentifier {
            input: input.into(),
            reason,
        }
    }
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

/// Reasons a layout, identity or epoch is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("epoch start {epoch_ms} ms lies after the current time {now_ms} ms")]
    EpochInFuture { epoch_ms: u64, now_ms: u64 },

    #[error(
        "{elapsed_ms} ms elapsed since the epoch exceed the timestamp field capacity of {max_ms} ms; move the epoch start forward"
    )]
    EpochOutOfRange { elapsed_ms: u64, max_ms: u64 },

    #[error("layout uses {total_bits} bits, at most 63 fit below the sign bit")]
    LayoutTooWide { total_bits: u32 },

    #[error("{field} field cannot be {bits} bits wide")]
    InvalidWidth { field: Field, bits: u8 },

    #[error("{field} id {value} is outside 0..={max}")]
    IdOutOfRange { field: Field, value: u64, max: u64 },

    #[error("invalid {option}: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: &'static str,
    },
}

/// Failures reported by a cache collaborator.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// The cache backend cannot be reached.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// An atomic operation returned a value that cannot be a counter.
    #[error("inconsistent counter {value} for key {key}")]
    Inconsistent { key: String, value: i64 },

    /// Any other backend-specific failure.
    #[error("cache backend error")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}
