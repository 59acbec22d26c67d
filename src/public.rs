use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::dispatch::Dispatch;
use crate::error::Error;
use crate::params::Capacity;
use crate::params::DefaultParams;
use crate::params::Params;
use crate::params::ParamsExt;
use crate::snapshot::Snapshot;
use crate::table::Table;
use crate::validate::Mismatch;
use crate::validate::compare;

/// A lock-free open-addressed hash table from `u32` keys to `u32` values.
///
/// `SimTab` has a fixed power-of-two capacity and is built for batches of
/// operations executed by many workers at once. Every operation takes `&self`
/// and only touches the table through per-slot atomics.
///
/// See the [crate-level documentation][crate] for an overview and examples.
///
/// # Type Parameters
///
/// - `P`: Configuration parameters implementing [`Params`]. Defaults to
///   [`DefaultParams`] (murmur3 hashing).
///
/// # Reserved Values
///
/// The key [`EMPTY_KEY`] and the value [`TOMBSTONE_VALUE`] mark unclaimed and
/// deleted slots. Inserting either is rejected with an error.
///
/// # Examples
///
/// ```
/// use simtab::SimTab;
///
/// let table = SimTab::new(1000);
/// assert_eq!(table.capacity(), 1024);
///
/// table.insert(42, 7).unwrap();
/// assert_eq!(table.lookup(42), Some(7));
/// ```
///
/// [`EMPTY_KEY`]: crate::EMPTY_KEY
/// [`TOMBSTONE_VALUE`]: crate::TOMBSTONE_VALUE
#[repr(transparent)]
pub struct SimTab<P = DefaultParams>
where
  P: Params + ?Sized,
{
  inner: Table<P>,
}

impl SimTab {
  /// Creates a table large enough for `request` entries, with seed `0`.
  ///
  /// The capacity is `request` rounded up to a power of two. See
  /// [`Capacity::new`] for the exact rules.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::SimTab;
  ///
  /// let table = SimTab::new(1000);
  ///
  /// assert_eq!(table.capacity(), 1024);
  /// assert_eq!(table.seed(), 0);
  /// assert!(table.is_empty());
  /// ```
  #[inline]
  pub fn new(request: u32) -> Self {
    Self::with_params(request, 0)
  }

  /// Creates a table large enough for `request` entries, hashing with `seed`.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::SimTab;
  ///
  /// let table = SimTab::with_seed(64, 0xDEAD_BEEF);
  /// assert_eq!(table.seed(), 0xDEAD_BEEF);
  /// ```
  #[inline]
  pub fn with_seed(request: u32, seed: u32) -> Self {
    Self::with_params(request, seed)
  }

  /// Creates a table with exactly `capacity` slots, with seed `0`.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::{Capacity, SimTab};
  ///
  /// let table = SimTab::with_capacity(Capacity::MIN);
  /// assert_eq!(table.capacity(), 1);
  /// ```
  #[inline]
  pub fn with_capacity(capacity: Capacity) -> Self {
    Self::from_capacity(capacity, 0)
  }
}

impl<P> SimTab<P>
where
  P: Params + ?Sized,
{
  /// Creates a table large enough for `request` entries using custom
  /// [`Params`].
  #[inline]
  pub fn with_params(request: u32, seed: u32) -> Self {
    Self::from_capacity(Capacity::new(request), seed)
  }

  /// Creates a table with exactly `capacity` slots using custom [`Params`].
  #[inline]
  pub fn from_capacity(capacity: Capacity, seed: u32) -> Self {
    Self {
      inner: Table::new(capacity, seed),
    }
  }

  /// Returns the number of slots in the table.
  ///
  /// Fixed for the lifetime of the table.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.inner.capacity().as_usize()
  }

  /// Returns the seed of the current generation.
  #[inline]
  pub fn seed(&self) -> u32 {
    self.inner.seed()
  }

  /// Returns the number of keys whose value is not a tombstone.
  ///
  /// This value may change immediately after reading due to concurrent
  /// operations in other threads.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::SimTab;
  ///
  /// let table = SimTab::new(16);
  ///
  /// table.insert(1, 1).unwrap();
  /// table.insert(2, 2).unwrap();
  /// assert_eq!(table.len(), 2);
  ///
  /// table.remove(1);
  /// assert_eq!(table.len(), 1);
  /// ```
  #[inline]
  pub fn len(&self) -> usize {
    self.inner.len() as usize
  }

  /// Returns `true` if the table holds no live keys.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.inner.len() == 0
  }

  /// Returns the number of slots claimed by a key since the last initialize.
  ///
  /// Deleted keys keep their slot, so this never decreases within a
  /// generation.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::SimTab;
  ///
  /// let table = SimTab::new(16);
  ///
  /// table.insert(1, 1).unwrap();
  /// table.remove(1);
  ///
  /// assert_eq!(table.len(), 0);
  /// assert_eq!(table.claimed(), 1);
  /// ```
  #[inline]
  pub fn claimed(&self) -> usize {
    self.inner.claimed() as usize
  }

  /// Returns the fraction of slots claimed by a key.
  ///
  /// Once this reaches `1.0`, inserts of new keys fail until the next
  /// initialize.
  #[inline]
  pub fn load_factor(&self) -> f64 {
    f64::from(self.inner.claimed()) / f64::from(self.inner.capacity().as_u32())
  }

  // ---------------------------------------------------------------------------
  // Single Operations
  // ---------------------------------------------------------------------------

  /// Inserts `value` for `key`, replacing any previous value.
  ///
  /// Reinserting a deleted key revives it in its original slot.
  ///
  /// # Errors
  ///
  /// - [`Error::ReservedKey`] if `key` is [`EMPTY_KEY`].
  /// - [`Error::ReservedValue`] if `value` is [`TOMBSTONE_VALUE`].
  /// - [`Error::CapacityExceeded`] if every slot is claimed by another key.
  ///
  /// The table is unchanged by a failed insert.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::{Error, SimTab};
  ///
  /// let table = SimTab::new(2);
  ///
  /// table.insert(1, 10).unwrap();
  /// table.insert(2, 20).unwrap();
  /// table.insert(1, 11).unwrap();
  ///
  /// assert_eq!(table.lookup(1), Some(11));
  /// assert_eq!(
  ///   table.insert(3, 30),
  ///   Err(Error::CapacityExceeded { key: 3, capacity: 2 }),
  /// );
  /// ```
  ///
  /// [`EMPTY_KEY`]: crate::EMPTY_KEY
  /// [`TOMBSTONE_VALUE`]: crate::TOMBSTONE_VALUE
  #[inline]
  pub fn insert(&self, key: u32, value: u32) -> Result<(), Error> {
    self.inner.insert(key, value)
  }

  /// Returns the value stored for `key`.
  ///
  /// A deleted key is still found and returns [`TOMBSTONE_VALUE`]. Use
  /// [`get`] to only see live values.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::{SimTab, TOMBSTONE_VALUE};
  ///
  /// let table = SimTab::new(16);
  ///
  /// table.insert(5, 50).unwrap();
  /// assert_eq!(table.lookup(5), Some(50));
  ///
  /// table.remove(5);
  /// assert_eq!(table.lookup(5), Some(TOMBSTONE_VALUE));
  ///
  /// assert_eq!(table.lookup(6), None);
  /// ```
  ///
  /// [`TOMBSTONE_VALUE`]: crate::TOMBSTONE_VALUE
  /// [`get`]: Self::get
  #[inline]
  pub fn lookup(&self, key: u32) -> Option<u32> {
    self.inner.lookup(key)
  }

  /// Returns the value stored for `key` unless it has been deleted.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::SimTab;
  ///
  /// let table = SimTab::new(16);
  ///
  /// table.insert(5, 50).unwrap();
  /// table.remove(5);
  ///
  /// assert_eq!(table.get(5), None);
  /// ```
  #[inline]
  pub fn get(&self, key: u32) -> Option<u32> {
    self.inner.get(key)
  }

  /// Returns `true` if `key` is present and has not been deleted.
  #[inline]
  pub fn contains_key(&self, key: u32) -> bool {
    self.inner.get(key).is_some()
  }

  /// Deletes `key`, leaving a tombstone in its slot.
  ///
  /// Returns `true` if this call deleted the key. Of any number of racing
  /// deletes of the same key, exactly one returns `true`.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::SimTab;
  ///
  /// let table = SimTab::new(16);
  /// table.insert(3, 30).unwrap();
  ///
  /// assert!(table.remove(3));  // Deleted
  /// assert!(!table.remove(3)); // Already a tombstone
  /// assert!(!table.remove(4)); // Never inserted
  /// ```
  #[inline]
  pub fn remove(&self, key: u32) -> bool {
    self.inner.remove(key)
  }

  // ---------------------------------------------------------------------------
  // Initialize
  // ---------------------------------------------------------------------------

  /// Empties every slot and starts a new generation hashing with `seed`.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::SimTab;
  ///
  /// let mut table = SimTab::new(16);
  /// table.insert(1, 1).unwrap();
  ///
  /// table.initialize(99);
  ///
  /// assert_eq!(table.lookup(1), None);
  /// assert_eq!(table.seed(), 99);
  /// assert!(table.snapshot().is_reset());
  /// ```
  #[inline]
  pub fn initialize(&mut self, seed: u32) {
    self.inner.initialize(seed);
  }

  /// Empties every slot with one dispatched lane per slot, then starts a new
  /// generation hashing with `seed`.
  ///
  /// The caller must not run any other operation on the table until this
  /// returns. Operations overlapping an initialize have unspecified (but
  /// memory-safe) results.
  #[inline]
  pub fn initialize_with<D>(&self, dispatch: &D, seed: u32)
  where
    D: Dispatch,
  {
    self.inner.initialize_with(dispatch, seed);
  }

  // ---------------------------------------------------------------------------
  // Batches
  // ---------------------------------------------------------------------------

  /// Inserts `values[i]` for `keys[i]`, one dispatched lane per key.
  ///
  /// Returns after every lane has completed. A batch must not contain the
  /// same key twice.
  ///
  /// # Errors
  ///
  /// - [`Error::LengthMismatch`] if the slices differ in length. No lane runs.
  /// - [`Error::Batch`] listing every lane whose insert failed. All other
  ///   lanes completed their insert.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::{Serial, SimTab};
  ///
  /// let table = SimTab::new(8);
  ///
  /// table.insert_batch(&Serial, &[1, 2, 3], &[10, 20, 30]).unwrap();
  /// assert_eq!(table.len(), 3);
  /// ```
  #[inline]
  pub fn insert_batch<D>(&self, dispatch: &D, keys: &[u32], values: &[u32]) -> Result<(), Error>
  where
    D: Dispatch,
  {
    self.inner.insert_batch(dispatch, keys, values)
  }

  /// Looks up every key, one dispatched lane per key.
  ///
  /// Lane `i` of the result is [`lookup(keys[i])`](Self::lookup).
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::{Serial, SimTab};
  ///
  /// let table = SimTab::new(8);
  /// table.insert(1, 10).unwrap();
  ///
  /// assert_eq!(table.lookup_batch(&Serial, &[1, 2]), [Some(10), None]);
  /// ```
  #[inline]
  pub fn lookup_batch<D>(&self, dispatch: &D, keys: &[u32]) -> Vec<Option<u32>>
  where
    D: Dispatch,
  {
    self.inner.lookup_batch(dispatch, keys)
  }

  /// Deletes every key, one dispatched lane per key.
  ///
  /// Lane `i` of the result is [`remove(keys[i])`](Self::remove).
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::{Serial, SimTab, TOMBSTONE_VALUE};
  ///
  /// let table = SimTab::new(8);
  /// table.insert_batch(&Serial, &[1, 2], &[10, 20]).unwrap();
  ///
  /// assert_eq!(table.delete_batch(&Serial, &[1, 3]), [true, false]);
  /// assert_eq!(table.lookup(1), Some(TOMBSTONE_VALUE));
  /// assert_eq!(table.lookup(2), Some(20));
  /// ```
  #[inline]
  pub fn delete_batch<D>(&self, dispatch: &D, keys: &[u32]) -> Vec<bool>
  where
    D: Dispatch,
  {
    self.inner.remove_batch(dispatch, keys)
  }

  // ---------------------------------------------------------------------------
  // Validation
  // ---------------------------------------------------------------------------

  /// Returns a copy of every slot, sentinels included.
  ///
  /// Only a consistent view of the table when no batch is running.
  #[inline]
  pub fn snapshot(&self) -> Snapshot {
    self.inner.snapshot()
  }

  /// Looks up every key and reports each lane whose value differs from
  /// `expected`.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::{Serial, SimTab, TOMBSTONE_VALUE};
  ///
  /// let table = SimTab::new(8);
  /// let keys: [u32; 2] = [1, 2];
  ///
  /// table.insert_batch(&Serial, &keys, &[10, 20]).unwrap();
  /// assert!(table.verify(&Serial, &keys, &[Some(10), Some(20)]).is_empty());
  ///
  /// table.delete_batch(&Serial, &keys);
  /// assert!(table.verify(&Serial, &keys, &[Some(TOMBSTONE_VALUE); 2]).is_empty());
  /// ```
  pub fn verify<D>(&self, dispatch: &D, keys: &[u32], expected: &[Option<u32>]) -> Vec<Mismatch>
  where
    D: Dispatch,
  {
    compare(keys, expected, &self.inner.lookup_batch(dispatch, keys))
  }
}

impl<P> Debug for SimTab<P>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("SimTab")
      .field("params", &P::debug())
      .field("capacity", &self.inner.capacity())
      .field("seed", &self.inner.seed())
      .field("entries", &self.inner)
      .finish()
  }
}

impl<P> Default for SimTab<P>
where
  P: Params + ?Sized,
{
  /// Creates a table with [`Capacity::DEF`] slots and seed `0`.
  #[inline]
  fn default() -> Self {
    Self::from_capacity(Capacity::DEF, 0)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::thread;
  use std::thread::JoinHandle;

  use crate::dispatch::Serial;
  use crate::params::Capacity;
  use crate::params::Params;
  use crate::public::SimTab;
  use crate::slot::TOMBSTONE_VALUE;
  use crate::validate::Mismatch;

  struct Collide;

  impl Params for Collide {
    fn hash(_key: u32, _seed: u32) -> u32 {
      0
    }
  }

  #[test]
  fn send_sync() {
    fn check<T: Send + Sync>() {}

    check::<SimTab>();
    check::<SimTab<Collide>>();
  }

  #[test]
  fn default_capacity() {
    let table: SimTab = SimTab::default();

    assert_eq!(table.capacity(), Capacity::DEF.as_usize());
    assert_eq!(table.seed(), 0);
  }

  #[test]
  fn load_factor() {
    let table: SimTab = SimTab::new(4);

    assert!(table.load_factor().abs() < f64::EPSILON);

    table.insert(1, 1).unwrap();
    table.insert(2, 2).unwrap();
    table.remove(2);

    assert!((table.load_factor() - 0.5).abs() < f64::EPSILON);
  }

  #[test]
  fn contains_key() {
    let table: SimTab = SimTab::new(16);

    table.insert(8, 0).unwrap();
    assert!(table.contains_key(8));

    table.remove(8);
    assert!(!table.contains_key(8));
    assert!(!table.contains_key(9));
  }

  #[test]
  fn verify_reports_mismatches() {
    let table: SimTab = SimTab::new(16);

    table.insert_batch(&Serial, &[1, 2], &[10, 20]).unwrap();
    table.remove(2);

    let mismatches: Vec<Mismatch> = table.verify(&Serial, &[1, 2, 3], &[Some(10), Some(20), None]);

    assert_eq!(
      mismatches,
      [Mismatch {
        lane: 1,
        key: 2,
        expected: Some(20),
        observed: Some(TOMBSTONE_VALUE),
      }],
    );
  }

  #[test]
  fn shared_across_threads() {
    let table: Arc<SimTab<Collide>> = Arc::new(SimTab::with_params(1024, 0));

    let handles: Vec<JoinHandle<()>> = (0..4)
      .map(|worker| {
        let table: Arc<SimTab<Collide>> = Arc::clone(&table);

        thread::spawn(move || {
          for index in 1..=100 {
            table.insert(worker * 1000 + index, index).unwrap();
          }
        })
      })
      .collect();

    for handle in handles {
      handle.join().unwrap();
    }

    assert_eq!(table.len(), 400);
    assert_eq!(table.claimed(), 400);
    assert!(table.snapshot().is_unique());

    for worker in 0..4 {
      for index in 1..=100 {
        assert_eq!(table.get(worker * 1000 + index), Some(index));
      }
    }
  }

  #[test]
  fn debug() {
    let table: SimTab<Collide> = SimTab::with_params(4, 3);

    table.insert(1, 10).unwrap();

    let debug: String = format!("{table:?}");

    assert!(debug.starts_with("SimTab { params: "));
    assert!(debug.contains("capacity: 4 (1 << 2), seed: 3, entries: {1: 10} }"));
  }
}
