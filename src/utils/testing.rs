use crate::params::Capacity;

/// Every power-of-two capacity exercised by exhaustive unit tests.
pub(crate) fn each_capacity() -> impl Iterator<Item = Capacity> {
  #[cfg(any(coverage, coverage_nightly, miri))]
  const BITS: u32 = 6;

  #[cfg(not(any(coverage, coverage_nightly, miri)))]
  const BITS: u32 = if cfg!(feature = "slow") { 16 } else { 10 };

  (0..=BITS).map(|bits| Capacity::new(1 << bits))
}
