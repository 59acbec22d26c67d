//! Linear probe sequences.

use core::iter::FusedIterator;

use crate::params::Capacity;

/// The ordered slot indices an operation visits for one key.
///
/// Starts at the key's home slot and walks forward one slot at a time,
/// wrapping at the end of the array. Yields every slot exactly once, so a
/// probe loop always terminates after `capacity` steps.
#[derive(Clone, Debug)]
pub(crate) struct Probe {
  index: usize,
  mask: usize,
  remaining: usize,
}

impl Probe {
  #[inline]
  pub(crate) const fn new(home: usize, capacity: Capacity) -> Self {
    let mask: usize = capacity.mask() as usize;

    Self {
      index: home & mask,
      mask,
      remaining: capacity.as_usize(),
    }
  }
}

impl Iterator for Probe {
  type Item = usize;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }

    let index: usize = self.index;

    self.index = (index + 1) & self.mask;
    self.remaining -= 1;

    Some(index)
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl ExactSizeIterator for Probe {}
impl FusedIterator for Probe {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
