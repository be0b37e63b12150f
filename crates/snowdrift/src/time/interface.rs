/// A source of wall-clock time, in milliseconds since the Unix epoch.
///
/// Generators subtract their layout's epoch start themselves, so a time
/// source knows nothing about custom epochs. Plug in [`SystemClock`],
/// [`MonotonicClock`], or a mocked time source in tests.
///
/// # Example
///
/// ```
/// use snowdrift::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_735_689_601_234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_735_689_601_234);
/// ```
///
/// [`SystemClock`]: crate::SystemClock
/// [`MonotonicClock`]: crate::MonotonicClock
pub trait TimeSource<T> {
    /// Returns the current time in milliseconds since 1970-01-01 UTC.
    fn current_millis(&self) -> T;
}

impl<T, S: TimeSource<T> + ?Sized> TimeSource<T> for &S {
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}

impl<T, S: TimeSource<T> + ?Sized> TimeSource<T> for std::sync::Arc<S> {
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}
