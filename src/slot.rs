//! Slot layout and sentinel values.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result;

use crate::sync::atomic::AtomicU32;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Relaxed;

/// Key of a slot that has not been claimed since the last initialize.
///
/// Never a valid application key.
pub const EMPTY_KEY: u32 = 0;

/// Value of a slot whose key has been deleted.
///
/// Never a valid application value. The key stays in place so that lookups
/// racing with the delete still find it.
pub const TOMBSTONE_VALUE: u32 = u32::MAX;

// -----------------------------------------------------------------------------
// Slot
// -----------------------------------------------------------------------------

/// One key/value storage location of the table.
///
/// The key is claimed with a CAS from [`EMPTY_KEY`] and is never released
/// until the whole table is initialized again. The value is written by the
/// claiming worker and afterwards only changes through atomic read-modify-write
/// operations.
///
/// An all-zero `Slot` is a valid empty slot.
#[repr(C, align(8))]
pub(crate) struct Slot {
  pub(crate) key: AtomicU32,
  pub(crate) value: AtomicU32,
}

impl Slot {
  #[cfg_attr(
    not(any(loom, shuttle, test)),
    allow(dead_code, reason = "zeroed memory is used outside of model tests")
  )]
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      key: AtomicU32::new(EMPTY_KEY),
      value: AtomicU32::new(0),
    }
  }

  /// Resets the slot through a shared reference.
  ///
  /// Only sound as part of an initialize that no batch overlaps.
  /// The value is cleared too: a leftover tombstone would be counted as a
  /// revival when the next generation reclaims the slot.
  #[inline]
  pub(crate) fn reset(&self) {
    self.key.store(EMPTY_KEY, Relaxed);
    self.value.store(0, Relaxed);
  }

  #[inline]
  pub(crate) fn load(&self) -> RawSlot {
    RawSlot {
      key: self.key.load(Acquire),
      value: self.value.load(Acquire),
    }
  }
}

// -----------------------------------------------------------------------------
// Raw Slot
// -----------------------------------------------------------------------------

/// A plain copy of one slot, sentinels included.
///
/// Produced by [`SimTab::snapshot`].
///
/// [`SimTab::snapshot`]: crate::public::SimTab::snapshot
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSlot {
  /// The slot key, or [`EMPTY_KEY`].
  pub key: u32,
  /// The slot value, or [`TOMBSTONE_VALUE`]. Meaningless for empty slots.
  pub value: u32,
}

impl RawSlot {
  /// Returns `true` if no key has claimed this slot.
  #[inline]
  pub const fn is_empty(&self) -> bool {
    self.key == EMPTY_KEY
  }

  /// Returns `true` if the slot holds a deleted key.
  #[inline]
  pub const fn is_tombstone(&self) -> bool {
    !self.is_empty() && self.value == TOMBSTONE_VALUE
  }

  /// Returns `true` if the slot holds a key that has not been deleted.
  #[inline]
  pub const fn is_live(&self) -> bool {
    !self.is_empty() && self.value != TOMBSTONE_VALUE
  }
}

impl Debug for RawSlot {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    if self.is_empty() {
      f.write_str("Empty")
    } else if self.is_tombstone() {
      write!(f, "Tombstone({})", self.key)
    } else {
      write!(f, "{} => {}", self.key, self.value)
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
