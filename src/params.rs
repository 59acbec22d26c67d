use core::any;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;
use core::num::NonZeroU32;
use core::num::NonZeroUsize;

use crossbeam_utils::CachePadded;

use crate::slot::Slot;

// -----------------------------------------------------------------------------
// Cache-line Properties
// -----------------------------------------------------------------------------

/// The size of a cache line in bytes.
///
/// The slot array is aligned to this boundary, and the table's mutable
/// counters are kept on a different line than its read-only layout data.
pub const CACHE_LINE: usize = size_of::<CachePadded<u8>>();

/// The number of table slots that fit in a single cache line.
pub const CACHE_LINE_SLOTS: usize = CACHE_LINE / size_of::<Slot>();

const _: () = assert!(
  CACHE_LINE.is_power_of_two(),
  "invalid params: `CACHE_LINE` must be a power of two",
);

#[cfg(not(any(loom, shuttle)))]
const _: () = assert!(
  CACHE_LINE.is_multiple_of(size_of::<Slot>()),
  "invalid params: `CACHE_LINE` must be a multiple of the slot width",
);

// -----------------------------------------------------------------------------
// Configurable Params
// -----------------------------------------------------------------------------

/// Configuration parameters for a [`SimTab`].
///
/// Selects the hash used to pick the first slot of every probe sequence. The
/// default ([`DefaultParams`]) applies the murmur3 32-bit finalizer to the key
/// mixed with the table seed.
///
/// # Implementing `Params`
///
/// ```
/// use simtab::{Params, SimTab};
///
/// struct Identity;
///
/// impl Params for Identity {
///   fn hash(key: u32, _seed: u32) -> u32 {
///     key
///   }
/// }
///
/// let table: SimTab<Identity> = SimTab::with_params(64, 0);
/// table.insert(7, 70).unwrap();
///
/// // With the identity hash, key 7 lands in slot 7.
/// assert_eq!(table.snapshot().slots()[7].key, 7);
/// ```
///
/// The hash must be a pure function of `key` and `seed`: every operation on
/// a key must start probing at the same slot for as long as the seed stays
/// unchanged.
///
/// [`SimTab`]: crate::public::SimTab
pub trait Params {
  /// Mixes `key` with `seed` into a well-distributed 32-bit hash.
  ///
  /// Only the low `log2(capacity)` bits of the result are used.
  #[inline]
  fn hash(key: u32, seed: u32) -> u32 {
    murmur3(key ^ seed)
  }
}

/// The murmur3 32-bit finalizer.
///
/// Every input bit affects every output bit, which keeps probe chains short
/// for sequential or otherwise structured keys.
///
/// # Examples
///
/// ```
/// use simtab::config::murmur3;
///
/// assert_eq!(murmur3(0), 0);
/// assert_ne!(murmur3(1), murmur3(2));
/// ```
#[inline]
pub const fn murmur3(mut value: u32) -> u32 {
  value ^= value >> 16;
  value = value.wrapping_mul(0x85EB_CA6B);
  value ^= value >> 13;
  value = value.wrapping_mul(0xC2B2_AE35);
  value ^= value >> 16;
  value
}

// -----------------------------------------------------------------------------
// Configurable Params - Extensions
// -----------------------------------------------------------------------------

/// Helpers derived from [`Params`].
///
/// Automatically implemented for all [`Params`] types.
pub trait ParamsExt: Params + Sealed {
  /// Returns the first probe index of `key` in a table of `capacity` slots.
  #[inline]
  fn home(key: u32, seed: u32, capacity: Capacity) -> usize {
    (Self::hash(key, seed) & capacity.mask()) as usize
  }

  #[inline]
  fn debug() -> DebugParams<Self> {
    DebugParams {
      marker: PhantomData,
    }
  }
}

// -----------------------------------------------------------------------------
// Debug Params
// -----------------------------------------------------------------------------

/// A helper type for displaying a [`Params`] configuration.
///
/// Returned by [`ParamsExt::debug`].
#[derive(Clone, Copy)]
pub struct DebugParams<P>
where
  P: ?Sized,
{
  marker: PhantomData<fn(P)>,
}

impl<P> Debug for DebugParams<P>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct(any::type_name::<P>())
      .field("CACHE_LINE", &CACHE_LINE)
      .field("CACHE_LINE_SLOTS", &CACHE_LINE_SLOTS)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Default Params
// -----------------------------------------------------------------------------

/// The default table configuration, hashing with [`murmur3`].
#[derive(Clone, Copy)]
#[non_exhaustive]
pub struct DefaultParams;

impl Debug for DefaultParams {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(&<Self as ParamsExt>::debug(), f)
  }
}

impl Params for DefaultParams {}

// -----------------------------------------------------------------------------
// Auto-implement Derive
// -----------------------------------------------------------------------------

mod private {
  pub trait Sealed {}
}

use private::Sealed;

impl<P> Sealed for P where P: Params + ?Sized {}
impl<P> ParamsExt for P where P: Params + ?Sized {}

// -----------------------------------------------------------------------------
// Capacity
// -----------------------------------------------------------------------------

/// A validated table capacity value.
///
/// Always a power of two in the range <code>[MIN]..=[MAX]</code>, so the
/// probe index can be reduced with a bitmask instead of a modulo.
///
/// # Construction
///
/// [`new()`] rounds the requested element count up to the nearest power of
/// two and clamps it to the valid range.
///
/// ```
/// use simtab::Capacity;
///
/// // Exact power of two
/// assert_eq!(Capacity::new(256).as_usize(), 256);
///
/// // Rounded up
/// assert_eq!(Capacity::new(1000).as_usize(), 1024);
///
/// // Zero still yields a usable table
/// assert_eq!(Capacity::new(0), Capacity::MIN);
///
/// // Clamped to maximum
/// assert_eq!(Capacity::new(u32::MAX), Capacity::MAX);
/// ```
///
/// [MIN]: Self::MIN
/// [MAX]: Self::MAX
/// [`new()`]: Self::new
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Capacity(NonZeroU32);

impl Capacity {
  /// The minimum supported capacity (2⁰ slots).
  pub const MIN: Self = Self(NonZeroU32::MIN);

  /// The maximum supported capacity (2³¹ slots).
  pub const MAX: Self = match NonZeroU32::new(1 << 31) {
    Some(value) => Self(value),
    None => panic!("invalid params: `Capacity::MAX` must be non-zero"),
  };

  /// The default capacity (2¹⁶ slots).
  pub const DEF: Self = Self::new(1 << 16);

  /// Creates a new [`Capacity`] large enough for `request` elements.
  ///
  /// Rounds up to the nearest power of two and clamps to
  /// <code>[MIN]..=[MAX]</code>.
  ///
  /// [MIN]: Self::MIN
  /// [MAX]: Self::MAX
  #[inline]
  pub const fn new(request: u32) -> Self {
    let Some(capacity) = request.checked_next_power_of_two() else {
      return Self::MAX;
    };

    match NonZeroU32::new(capacity) {
      Some(capacity) => Self(capacity),
      None => Self::MIN,
    }
  }

  /// Returns the capacity as a [`u32`].
  #[inline]
  pub const fn as_u32(self) -> u32 {
    self.0.get()
  }

  /// Returns the capacity as a [`usize`].
  #[inline]
  pub const fn as_usize(self) -> usize {
    self.0.get() as usize
  }

  /// Returns the capacity as a [`NonZeroUsize`].
  #[inline]
  pub const fn as_nonzero(self) -> NonZeroUsize {
    match NonZeroUsize::new(self.as_usize()) {
      Some(value) => value,
      None => NonZeroUsize::MIN,
    }
  }

  /// Returns the mask that reduces a hash to a slot index (`capacity - 1`).
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::Capacity;
  ///
  /// assert_eq!(Capacity::new(1024).mask(), 0x3FF);
  /// ```
  #[inline]
  pub const fn mask(self) -> u32 {
    self.0.get() - 1
  }

  /// Returns the base-2 logarithm of the capacity.
  ///
  /// # Examples
  ///
  /// ```
  /// use simtab::Capacity;
  ///
  /// assert_eq!(Capacity::new(1024).log2(), 10);
  /// ```
  #[inline]
  pub const fn log2(self) -> u32 {
    self.0.trailing_zeros()
  }
}

impl Debug for Capacity {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{:?} (1 << {:?})", self.0, self.log2())
  }
}

impl Default for Capacity {
  #[inline]
  fn default() -> Self {
    Self::DEF
  }
}

impl From<Capacity> for NonZeroU32 {
  #[inline]
  fn from(other: Capacity) -> Self {
    other.0
  }
}

impl From<Capacity> for u32 {
  #[inline]
  fn from(other: Capacity) -> Self {
    other.as_u32()
  }
}

impl From<Capacity> for usize {
  #[inline]
  fn from(other: Capacity) -> Self {
    other.as_usize()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
