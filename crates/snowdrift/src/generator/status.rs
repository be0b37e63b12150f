use crate::id::SnowflakeId;

/// Outcome of one attempt to generate an identifier.
///
/// [`Poll::Pending`] means the sequence space of the current millisecond is
/// exhausted. Wait briefly and poll again with a fresh clock read; it is
/// rate limiting, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Poll {
    /// A unique identifier was generated.
    Ready { id: SnowflakeId },
    /// The resolver handed out a sequence past the layout's maximum.
    Pending {
        /// Unix millisecond of the attempt.
        timestamp: u64,
        /// The rejected sequence number.
        sequence: u64,
    },
}

impl Poll {
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
