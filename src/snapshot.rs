//! Raw dumps of table state.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result;
use core::ops::Index;
use core::slice;
use std::collections::HashSet;

use crate::slot::EMPTY_KEY;
use crate::slot::RawSlot;

/// A copy of every slot of a table, sentinels included.
///
/// Taken with [`SimTab::snapshot`] between batches to check table
/// invariants. A snapshot taken while a batch is running is not a
/// consistent cut of the table.
///
/// # Examples
///
/// ```
/// use simtab::{SimTab, Snapshot};
///
/// let mut table = SimTab::new(16);
///
/// table.insert(1, 10).unwrap();
/// table.insert(2, 20).unwrap();
/// table.remove(2);
///
/// let snapshot: Snapshot = table.snapshot();
///
/// assert_eq!(snapshot.len(), 16);
/// assert_eq!(snapshot.occupied(), 2);
/// assert_eq!(snapshot.live(), 1);
/// assert_eq!(snapshot.tombstones(), 1);
///
/// table.initialize(0);
/// assert!(table.snapshot().is_reset());
/// ```
///
/// [`SimTab::snapshot`]: crate::public::SimTab::snapshot
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
  slots: Box<[RawSlot]>,
}

impl Snapshot {
  /// Returns every slot, in table order.
  #[inline]
  pub fn slots(&self) -> &[RawSlot] {
    &self.slots
  }

  /// Returns an iterator over every slot, in table order.
  #[inline]
  pub fn iter(&self) -> slice::Iter<'_, RawSlot> {
    self.slots.iter()
  }

  /// Returns the number of slots, which is the table capacity.
  #[inline]
  pub fn len(&self) -> usize {
    self.slots.len()
  }

  /// Returns `true` if the snapshot holds no slots.
  ///
  /// Never the case for snapshots of a table.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  /// Returns `true` if every slot key is [`EMPTY_KEY`].
  pub fn is_reset(&self) -> bool {
    self.iter().all(RawSlot::is_empty)
  }

  /// Returns the number of slots claimed by a key, tombstones included.
  pub fn occupied(&self) -> usize {
    self.iter().filter(|slot| !slot.is_empty()).count()
  }

  /// Returns the number of slots holding a deleted key.
  pub fn tombstones(&self) -> usize {
    self.iter().filter(|slot| slot.is_tombstone()).count()
  }

  /// Returns the number of slots holding a key that has not been deleted.
  pub fn live(&self) -> usize {
    self.iter().filter(|slot| slot.is_live()).count()
  }

  /// Finds the slot holding `key` by scanning the whole snapshot.
  ///
  /// Returns the slot index and its contents.
  pub fn find(&self, key: u32) -> Option<(usize, RawSlot)> {
    if key == EMPTY_KEY {
      return None;
    }

    self
      .iter()
      .enumerate()
      .find(|(_, slot)| slot.key == key)
      .map(|(index, slot)| (index, *slot))
  }

  /// Returns `true` if no key occupies more than one slot.
  pub fn is_unique(&self) -> bool {
    let mut seen: HashSet<u32> = HashSet::with_capacity(self.len());

    self
      .iter()
      .filter(|slot| !slot.is_empty())
      .all(|slot| seen.insert(slot.key))
  }
}

impl Index<usize> for Snapshot {
  type Output = RawSlot;

  #[inline]
  fn index(&self, index: usize) -> &Self::Output {
    &self.slots[index]
  }
}

impl<'a> IntoIterator for &'a Snapshot {
  type Item = &'a RawSlot;
  type IntoIter = slice::Iter<'a, RawSlot>;

  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl FromIterator<RawSlot> for Snapshot {
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = RawSlot>,
  {
    Self {
      slots: iter.into_iter().collect(),
    }
  }
}

impl Debug for Snapshot {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    f.debug_map()
      .entries(self.iter().enumerate().filter(|(_, slot)| !slot.is_empty()))
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
