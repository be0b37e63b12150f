use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// Reads `SystemTime::now()` on every call.
///
/// Follows wall-clock adjustments. A clock set before 1970 reads as zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource<u64> for SystemClock {
    fn current_millis(&self) -> u64 {
        unix_millis()
    }
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}
