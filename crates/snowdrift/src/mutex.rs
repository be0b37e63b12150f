#[cfg(feature = "parking-lot")]
pub use parking_lot::{Mutex, MutexGuard};
#[cfg(not(feature = "parking-lot"))]
pub use std::sync::{Mutex, MutexGuard};

use crate::error::Result;

/// Locks `mutex`, mapping poisoning to [`Error::LockPoisoned`] when std
/// mutexes are in use.
///
/// [`Error::LockPoisoned`]: crate::Error
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    #[cfg(feature = "parking-lot")]
    {
        Ok(mutex.lock())
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        Ok(mutex.lock()?)
    }
}
