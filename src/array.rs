//! Cache-aligned array allocation.
//!
//! Provides [`Array`], the backing storage for table slots.

use core::marker::PhantomData;
use core::mem;
use core::mem::ManuallyDrop;
use core::mem::MaybeUninit;
use core::ptr;
use core::ptr::NonNull;
use core::slice;

use crate::alloc::Layout;
use crate::alloc::alloc;
use crate::alloc::dealloc;
use crate::alloc::handle_alloc_error;
use crate::params::CACHE_LINE;
use crate::params::Capacity;

/// A fixed-size array with cache-line-aligned allocation.
///
/// The length is chosen at runtime but never changes afterwards.
pub(crate) struct Array<T> {
  nonnull: NonNull<T>,
  length: Capacity,
  phantom: PhantomData<T>,
}

impl<T> Array<T> {
  /// Creates a new array, initializing each element with the given function.
  #[allow(dead_code, reason = "only used by model tests")]
  #[inline]
  pub(crate) fn new<F>(length: Capacity, init: F) -> Self
  where
    F: Fn(usize, &mut MaybeUninit<T>),
  {
    let mut this: Array<MaybeUninit<T>> = Self::new_uninit(length);

    for (index, uninit) in this.as_mut_slice().iter_mut().enumerate() {
      init(index, uninit);
    }

    // SAFETY: Every element was initialized by the loop.
    unsafe { this.assume_init() }
  }

  /// Creates a new array with all bytes zeroed.
  #[allow(dead_code, reason = "not used with loom or shuttle")]
  #[inline]
  pub(crate) fn new_zeroed(length: Capacity) -> Array<MaybeUninit<T>> {
    let this: Array<MaybeUninit<T>> = Self::new_uninit(length);

    // SAFETY: Allocation holds `length` elements; zeroing `MaybeUninit` is valid.
    unsafe {
      this.nonnull.write_bytes(0, length.as_usize());
    }

    this
  }

  /// Creates a new array without initializing its contents.
  ///
  /// # Panics
  ///
  /// Panics if `length` elements of `T` do not fit in `isize::MAX` bytes.
  #[inline]
  pub(crate) fn new_uninit(length: Capacity) -> Array<MaybeUninit<T>> {
    let layout: Layout = Self::layout(length);

    // SAFETY: `layout` has non-zero size because `length >= 1` and slots are
    // not zero-sized.
    let raw: *mut u8 = unsafe { alloc(layout) };

    Array {
      nonnull: match NonNull::new(raw.cast()) {
        Some(ptr) => ptr,
        None => handle_alloc_error(layout),
      },
      length,
      phantom: PhantomData,
    }
  }

  /// Computes the allocation layout for `length` elements.
  ///
  /// The size is rounded up to a whole number of cache lines.
  fn layout(length: Capacity) -> Layout {
    const {
      assert!(size_of::<T>() != 0, "invalid array: zero-sized elements");
    }

    let align: usize = CACHE_LINE.max(align_of::<T>());

    let size: Option<usize> = size_of::<T>()
      .checked_mul(length.as_usize())
      .and_then(|bytes| bytes.checked_next_multiple_of(align));

    match size.map(|size| Layout::from_size_align(size, align)) {
      Some(Ok(layout)) => layout,
      Some(Err(_)) | None => panic!("invalid capacity: {length:?} slots exceed the address space"),
    }
  }

  #[inline]
  pub(crate) const fn len(&self) -> usize {
    self.length.as_usize()
  }

  /// Returns a raw pointer to the array.
  #[inline]
  pub(crate) const fn as_ptr(&self) -> *const T {
    self.nonnull.as_ptr()
  }

  #[inline]
  pub(crate) const fn as_slice(&self) -> &[T] {
    // SAFETY: Contiguous allocation of `length` initialized elements.
    unsafe { slice::from_raw_parts(self.as_ptr(), self.len()) }
  }

  #[inline]
  pub(crate) const fn as_mut_slice(&mut self) -> &mut [T] {
    // SAFETY: Contiguous allocation of `length` initialized elements, and
    // `&mut self` guarantees exclusive access.
    unsafe { slice::from_raw_parts_mut(self.nonnull.as_ptr(), self.len()) }
  }

  /// Returns a reference to the element at the given index.
  ///
  /// Probe indices are always masked by the capacity, so the bounds check
  /// only fires on internal bugs.
  #[inline]
  pub(crate) fn get(&self, index: usize) -> &T {
    &self.as_slice()[index]
  }
}

impl<T> Array<MaybeUninit<T>> {
  /// Converts to an initialized array.
  ///
  /// # Safety
  ///
  /// All elements must be initialized.
  #[inline]
  pub(crate) unsafe fn assume_init(self) -> Array<T> {
    // Prevent drop from running on `self` (would deallocate).
    let this: ManuallyDrop<Self> = ManuallyDrop::new(self);

    Array {
      nonnull: this.nonnull.cast(),
      length: this.length,
      phantom: PhantomData,
    }
  }
}

impl<T> Drop for Array<T> {
  fn drop(&mut self) {
    if mem::needs_drop::<T>() {
      // SAFETY: Every element is initialized and is never accessed again.
      unsafe {
        ptr::drop_in_place(self.as_mut_slice());
      }
    }

    // SAFETY: Allocated with `Self::layout(self.length)` in `new_uninit`.
    unsafe {
      dealloc(self.nonnull.cast().as_ptr(), Self::layout(self.length));
    }
  }
}

// SAFETY: `Array` owns its elements like a `Box<[T]>`.
unsafe impl<T> Send for Array<T> where T: Send {}

// SAFETY: Shared access only hands out `&T`.
unsafe impl<T> Sync for Array<T> where T: Sync {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
