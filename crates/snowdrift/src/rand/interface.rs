/// A source of random integers.
///
/// Plug in [`ThreadRandom`](crate::ThreadRandom) or a fixed sequence in tests.
///
/// # Example
/// ```
/// use snowdrift::RandSource;
///
/// struct FixedRand;
/// impl RandSource<u32> for FixedRand {
///     fn rand(&self) -> u32 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedRand.rand(), 1234);
/// ```
pub trait RandSource<T> {
    /// Returns a random integer.
    fn rand(&self) -> T;
}
