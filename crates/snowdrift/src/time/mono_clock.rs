use portable_atomic::{AtomicU64, Ordering};
use std::{
    sync::{Arc, OnceLock},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::system::unix_millis;
use crate::TimeSource;

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source anchored to the wall clock at construction.
///
/// The Unix time is sampled once; after that a background thread advances a
/// shared atomic counter once per millisecond using `Instant`. Reads never
/// make a syscall and never go backward, even if the system clock is
/// adjusted.
///
/// Clones share the ticker. The thread exits once the last clone is dropped.
///
/// # Example
///
/// ```
/// use snowdrift::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::new();
/// let first = clock.current_millis();
/// std::thread::sleep(std::time::Duration::from_millis(3));
/// assert!(clock.current_millis() >= first);
/// ```
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    /// Unix milliseconds at construction.
    anchor: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::anchored_at(unix_millis())
    }

    /// Starts a clock that reads `anchor` now and advances in real time.
    pub fn anchored_at(anchor: u64) -> Self {
        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                let target = start + Duration::from_millis(tick);
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                inner_ref.current.store(now_ms, Ordering::Release);

                tick = now_ms + 1;
            }
        });

        // Freshly created lock, the set cannot fail.
        let _ = inner._handle.set(handle);

        Self { inner, anchor }
    }
}

impl TimeSource<u64> for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.anchor + self.inner.current.load(Ordering::Acquire)
    }
}
