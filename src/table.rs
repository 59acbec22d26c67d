//! Core table implementation.
//!
//! Every operation probes linearly from the key's home slot. Slots move
//! through a single state machine:
//!
//! ```text
//! EMPTY -> (key, value) -> (key, TOMBSTONE) -> (key, value') -> ...
//! ```
//!
//! A key is claimed with a CAS from `EMPTY_KEY` and is never released until
//! the next initialize, which is what allows lookups to stop at the first
//! empty slot.

use core::fmt::Debug;
use core::fmt::DebugMap;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;

use crossbeam_utils::CachePadded;

use crate::array::Array;
use crate::dispatch::Dispatch;
use crate::error::Error;
use crate::params::Capacity;
use crate::params::Params;
use crate::params::ParamsExt;
use crate::probe::Probe;
use crate::slot::EMPTY_KEY;
use crate::slot::RawSlot;
use crate::slot::Slot;
use crate::slot::TOMBSTONE_VALUE;
use crate::snapshot::Snapshot;
use crate::sync::atomic::AtomicU32;
use crate::sync::atomic::Ordering::AcqRel;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Relaxed;
use crate::sync::atomic::Ordering::Release;
use crate::utils::log_debug;
use crate::utils::log_warn;

/// Outcome of trying to claim a single slot for a key.
enum Claim {
  /// The slot was empty and now belongs to the caller.
  Won,
  /// The slot already belongs to the key.
  Held,
  /// The slot belongs to a different key.
  Taken,
}

// -----------------------------------------------------------------------------
// Table State
// -----------------------------------------------------------------------------

#[repr(C)]
pub(crate) struct Table<P>
where
  P: Params + ?Sized,
{
  volatile: CachePadded<Volatile>,
  readonly: CachePadded<ReadOnly>,
  phantom: PhantomData<fn(P)>,
}

impl<P> Table<P>
where
  P: Params + ?Sized,
{
  #[track_caller]
  #[inline]
  pub(crate) fn new(capacity: Capacity, seed: u32) -> Self {
    Self {
      volatile: CachePadded::new(Volatile::new()),
      readonly: CachePadded::new(ReadOnly::new(capacity, seed)),
      phantom: PhantomData,
    }
  }

  #[inline]
  pub(crate) fn capacity(&self) -> Capacity {
    self.readonly.capacity
  }

  #[inline]
  pub(crate) fn seed(&self) -> u32 {
    self.readonly.seed.load(Relaxed)
  }

  #[inline]
  pub(crate) fn len(&self) -> u32 {
    self.volatile.live.load(Relaxed)
  }

  #[inline]
  pub(crate) fn claimed(&self) -> u32 {
    self.volatile.claimed.load(Relaxed)
  }

  // ---------------------------------------------------------------------------
  // Initialize
  // ---------------------------------------------------------------------------

  /// Resets every slot to empty and binds `seed` for the next generation.
  pub(crate) fn initialize(&mut self, seed: u32) {
    self.readonly.reset_mut();
    self.readonly.seed.store(seed, Relaxed);
    self.volatile.reset();

    log_debug!("initialized {} slots with seed {:#010x}", self.capacity().as_u32(), seed);
  }

  /// Resets every slot to empty, one slot per lane.
  ///
  /// The caller guarantees that no other batch runs until this returns.
  pub(crate) fn initialize_with<D>(&self, dispatch: &D, seed: u32)
  where
    D: Dispatch,
  {
    let slots: &Array<Slot> = &self.readonly.slots;

    dispatch.dispatch(slots.len(), |lane| slots.get(lane).reset());

    self.readonly.seed.store(seed, Relaxed);
    self.volatile.reset();

    log_debug!("initialized {} slots with seed {:#010x}", self.capacity().as_u32(), seed);
  }

  // ---------------------------------------------------------------------------
  // Insert
  // ---------------------------------------------------------------------------

  pub(crate) fn insert(&self, key: u32, value: u32) -> Result<(), Error> {
    if key == EMPTY_KEY {
      return Err(Error::ReservedKey);
    }

    if value == TOMBSTONE_VALUE {
      return Err(Error::ReservedValue { key });
    }

    for index in self.probe(key) {
      let slot: &Slot = self.readonly.slots.get(index);

      match self.claim(slot, key) {
        Claim::Won => {
          // Only the CAS winner writes the first value of a slot.
          slot.value.store(value, Release);
          self.volatile.claimed.fetch_add(1, Relaxed);
          self.volatile.live.fetch_add(1, Relaxed);
          return Ok(());
        }
        Claim::Held => {
          self.replace(slot, value);
          return Ok(());
        }
        Claim::Taken => {}
      }
    }

    Err(Error::CapacityExceeded {
      key,
      capacity: self.capacity().as_u32(),
    })
  }

  #[inline]
  fn claim(&self, slot: &Slot, key: u32) -> Claim {
    let current: u32 = slot.key.load(Acquire);

    if current == key {
      return Claim::Held;
    }

    if current != EMPTY_KEY {
      return Claim::Taken;
    }

    match slot.key.compare_exchange(EMPTY_KEY, key, AcqRel, Acquire) {
      Ok(_) => Claim::Won,
      Err(current) if current == key => Claim::Held,
      Err(_) => Claim::Taken,
    }
  }

  /// Overwrites the value of a slot already holding the key.
  ///
  /// Must be an atomic read-modify-write: a plain store could overwrite a
  /// concurrent delete's tombstone without the delete noticing, or revive an
  /// entry without `live` being updated.
  #[inline]
  fn replace(&self, slot: &Slot, value: u32) {
    if slot.value.swap(value, AcqRel) == TOMBSTONE_VALUE {
      self.volatile.live.fetch_add(1, Relaxed);
    }
  }

  // ---------------------------------------------------------------------------
  // Lookup
  // ---------------------------------------------------------------------------

  /// Returns the raw value stored for `key`, tombstones included.
  #[inline]
  pub(crate) fn lookup(&self, key: u32) -> Option<u32> {
    self.find(key).map(|slot| slot.value.load(Acquire))
  }

  /// Returns the value stored for `key` unless it has been deleted.
  #[inline]
  pub(crate) fn get(&self, key: u32) -> Option<u32> {
    self.lookup(key).filter(|value| *value != TOMBSTONE_VALUE)
  }

  fn find(&self, key: u32) -> Option<&Slot> {
    if key == EMPTY_KEY {
      return None;
    }

    for index in self.probe(key) {
      let slot: &Slot = self.readonly.slots.get(index);

      match slot.key.load(Acquire) {
        // Inserts never skip an empty slot, so the key is absent.
        EMPTY_KEY => return None,
        current if current == key => return Some(slot),
        _ => {}
      }
    }

    None
  }

  // ---------------------------------------------------------------------------
  // Delete
  // ---------------------------------------------------------------------------

  /// Replaces the value of `key` with a tombstone.
  ///
  /// Returns `true` for exactly one of any number of racing deletes. The key
  /// itself stays in place.
  pub(crate) fn remove(&self, key: u32) -> bool {
    let Some(slot) = self.find(key) else {
      return false;
    };

    let mut current: u32 = slot.value.load(Acquire);

    while current != TOMBSTONE_VALUE {
      match slot.value.compare_exchange_weak(current, TOMBSTONE_VALUE, AcqRel, Acquire) {
        Ok(_) => {
          self.volatile.live.fetch_sub(1, Relaxed);
          return true;
        }
        Err(actual) => {
          current = actual;
        }
      }
    }

    false
  }

  // ---------------------------------------------------------------------------
  // Batches
  // ---------------------------------------------------------------------------

  pub(crate) fn insert_batch<D>(&self, dispatch: &D, keys: &[u32], values: &[u32]) -> Result<(), Error>
  where
    D: Dispatch,
  {
    if keys.len() != values.len() {
      return Err(Error::LengthMismatch {
        keys: keys.len(),
        values: values.len(),
      });
    }

    let failures: Vec<(usize, Error)> = dispatch
      .dispatch(keys.len(), |lane| self.insert(keys[lane], values[lane]))
      .into_iter()
      .enumerate()
      .filter_map(|(lane, result)| result.err().map(|error| (lane, error)))
      .collect();

    if failures.is_empty() {
      log_debug!("inserted {} keys, {} live entries", keys.len(), self.len());
      return Ok(());
    }

    log_warn!(
      "{} of {} inserts failed, {} of {} slots claimed",
      failures.len(),
      keys.len(),
      self.claimed(),
      self.capacity().as_u32(),
    );

    Err(Error::Batch {
      lanes: keys.len(),
      failures,
    })
  }

  pub(crate) fn lookup_batch<D>(&self, dispatch: &D, keys: &[u32]) -> Vec<Option<u32>>
  where
    D: Dispatch,
  {
    let values: Vec<Option<u32>> = dispatch.dispatch(keys.len(), |lane| self.lookup(keys[lane]));

    log_debug!("looked up {} keys", keys.len());

    values
  }

  pub(crate) fn remove_batch<D>(&self, dispatch: &D, keys: &[u32]) -> Vec<bool>
  where
    D: Dispatch,
  {
    let removed: Vec<bool> = dispatch.dispatch(keys.len(), |lane| self.remove(keys[lane]));

    log_debug!("deleted {} keys, {} live entries", keys.len(), self.len());

    removed
  }

  // ---------------------------------------------------------------------------
  // Raw Access
  // ---------------------------------------------------------------------------

  pub(crate) fn snapshot(&self) -> Snapshot {
    self.readonly.slots.as_slice().iter().map(Slot::load).collect()
  }

  #[inline]
  fn probe(&self, key: u32) -> Probe {
    Probe::new(P::home(key, self.seed(), self.capacity()), self.capacity())
  }
}

impl<P> Debug for Table<P>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let mut debug: DebugMap<'_, '_> = f.debug_map();

    for slot in self.readonly.slots.as_slice() {
      let raw: RawSlot = slot.load();

      if raw.is_live() {
        debug.entry(&raw.key, &raw.value);
      }
    }

    debug.finish()
  }
}

// -----------------------------------------------------------------------------
// Volatile State
// -----------------------------------------------------------------------------

/// Counters modified during operations.
///
/// Isolated from [`ReadOnly`] via cache padding to avoid false sharing.
#[repr(C)]
struct Volatile {
  /// Number of keys whose value is not a tombstone.
  live: AtomicU32,
  /// Number of slots claimed by a key since the last initialize.
  claimed: AtomicU32,
}

impl Volatile {
  #[inline]
  fn new() -> Self {
    Self {
      live: AtomicU32::new(0),
      claimed: AtomicU32::new(0),
    }
  }

  #[inline]
  fn reset(&self) {
    self.live.store(0, Relaxed);
    self.claimed.store(0, Relaxed);
  }
}

// -----------------------------------------------------------------------------
// Read-only State
// -----------------------------------------------------------------------------

/// Table state that batches only read.
///
/// Individual slots are modified atomically, but the array itself never
/// resizes. The seed only changes during initialize.
#[repr(C)]
struct ReadOnly {
  slots: Array<Slot>,
  capacity: Capacity,
  seed: AtomicU32,
}

impl ReadOnly {
  #[inline]
  fn new(capacity: Capacity, seed: u32) -> Self {
    Self {
      slots: Self::new_slot_array(capacity),
      capacity,
      seed: AtomicU32::new(seed),
    }
  }

  #[cfg(not(any(loom, shuttle)))]
  #[inline]
  fn new_slot_array(capacity: Capacity) -> Array<Slot> {
    // SAFETY: All-zeros is a valid empty `Slot`.
    unsafe { Array::new_zeroed(capacity).assume_init() }
  }

  #[cfg(any(loom, shuttle))]
  #[inline]
  fn new_slot_array(capacity: Capacity) -> Array<Slot> {
    Array::new(capacity, |_, slot| {
      slot.write(Slot::new());
    })
  }

  #[cfg(not(any(loom, shuttle)))]
  #[inline]
  fn reset_mut(&mut self) {
    let slots: &mut [Slot] = self.slots.as_mut_slice();

    // SAFETY: `&mut self` rules out concurrent access, and all-zeros is a
    // valid empty `Slot`.
    unsafe {
      slots.as_mut_ptr().write_bytes(0, slots.len());
    }
  }

  #[cfg(any(loom, shuttle))]
  #[inline]
  fn reset_mut(&mut self) {
    for slot in self.slots.as_mut_slice() {
      *slot = Slot::new();
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
