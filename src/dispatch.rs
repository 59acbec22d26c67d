//! Parallel execution of batches.
//!
//! A batch runs one kernel invocation per lane. Every [`Dispatch`]
//! implementation returns only after all lanes have completed, which is the
//! full barrier the table requires between consecutive batches.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::num::NonZeroUsize;
use std::panic;
use std::thread;
use std::thread::ScopedJoinHandle;

/// Runs a kernel once per lane, possibly in parallel.
///
/// # Contract
///
/// - `kernel` is invoked exactly once for every lane in `0..lanes`.
/// - The returned vector holds the result of lane `i` at index `i`.
/// - All invocations have completed (and their effects are visible to the
///   caller) when `dispatch` returns.
///
/// # Examples
///
/// ```
/// use simtab::{Dispatch, Serial};
///
/// let squares: Vec<usize> = Serial.dispatch(4, |lane| lane * lane);
/// assert_eq!(squares, [0, 1, 4, 9]);
/// ```
pub trait Dispatch {
  /// Runs `kernel` for every lane in `0..lanes` and collects the results.
  fn dispatch<T, F>(&self, lanes: usize, kernel: F) -> Vec<T>
  where
    T: Send,
    F: Fn(usize) -> T + Send + Sync;
}

impl<D> Dispatch for &D
where
  D: Dispatch + ?Sized,
{
  #[inline]
  fn dispatch<T, F>(&self, lanes: usize, kernel: F) -> Vec<T>
  where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
  {
    (**self).dispatch(lanes, kernel)
  }
}

// -----------------------------------------------------------------------------
// Serial
// -----------------------------------------------------------------------------

/// Runs every lane on the calling thread, in lane order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Serial;

impl Dispatch for Serial {
  #[inline]
  fn dispatch<T, F>(&self, lanes: usize, kernel: F) -> Vec<T>
  where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
  {
    (0..lanes).map(kernel).collect()
  }
}

// -----------------------------------------------------------------------------
// Scoped Threads
// -----------------------------------------------------------------------------

/// Splits the lanes into contiguous chunks, one per scoped worker thread.
///
/// Threads are spawned per batch and joined before `dispatch` returns. A
/// panic in any lane is propagated to the caller after all workers have
/// stopped.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Scoped {
  workers: NonZeroUsize,
}

impl Scoped {
  /// Creates a dispatcher using exactly `workers` threads per batch.
  #[inline]
  pub const fn new(workers: NonZeroUsize) -> Self {
    Self { workers }
  }

  /// Creates a dispatcher using one thread per available CPU.
  #[inline]
  pub fn available() -> Self {
    Self::new(thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
  }

  /// Returns the number of worker threads.
  #[inline]
  pub const fn workers(&self) -> NonZeroUsize {
    self.workers
  }
}

impl Default for Scoped {
  #[inline]
  fn default() -> Self {
    Self::available()
  }
}

impl Debug for Scoped {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Scoped").field("workers", &self.workers).finish()
  }
}

impl Dispatch for Scoped {
  fn dispatch<T, F>(&self, lanes: usize, kernel: F) -> Vec<T>
  where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
  {
    let workers: usize = self.workers.get().min(lanes);

    if workers <= 1 {
      return Serial.dispatch(lanes, kernel);
    }

    let chunk: usize = lanes.div_ceil(workers);
    let kernel: &F = &kernel;

    thread::scope(|scope| {
      let handles: Vec<ScopedJoinHandle<'_, Vec<T>>> = (0..workers)
        .map(|worker| {
          let start: usize = (worker * chunk).min(lanes);
          let end: usize = (start + chunk).min(lanes);

          scope.spawn(move || (start..end).map(kernel).collect())
        })
        .collect();

      let mut output: Vec<T> = Vec::with_capacity(lanes);
      let mut poison: Option<Box<dyn core::any::Any + Send>> = None;

      for handle in handles {
        match handle.join() {
          Ok(part) => output.extend(part),
          Err(payload) => {
            poison.get_or_insert(payload);
          }
        }
      }

      if let Some(payload) = poison {
        panic::resume_unwind(payload);
      }

      output
    })
  }
}

// -----------------------------------------------------------------------------
// Rayon
// -----------------------------------------------------------------------------

/// Runs lanes on a rayon thread pool.
///
/// Uses the global pool unless constructed with [`Rayon::with_pool`].
#[cfg(feature = "rayon")]
#[cfg_attr(docsrs, doc(cfg(feature = "rayon")))]
#[derive(Debug, Default)]
pub struct Rayon {
  pool: Option<rayon::ThreadPool>,
}

#[cfg(feature = "rayon")]
impl Rayon {
  /// Creates a dispatcher backed by the global rayon pool.
  #[inline]
  pub const fn global() -> Self {
    Self { pool: None }
  }

  /// Creates a dispatcher backed by a dedicated pool.
  #[inline]
  pub fn with_pool(pool: rayon::ThreadPool) -> Self {
    Self { pool: Some(pool) }
  }
}

#[cfg(feature = "rayon")]
impl Dispatch for Rayon {
  fn dispatch<T, F>(&self, lanes: usize, kernel: F) -> Vec<T>
  where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
  {
    use rayon::prelude::*;

    let run = move || -> Vec<T> { (0..lanes).into_par_iter().map(kernel).collect() };

    match self.pool {
      Some(ref pool) => pool.install(run),
      None => run(),
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use core::num::NonZeroUsize;
  use std::collections::HashSet;
  use std::sync::Mutex;
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;
  use std::thread;
  use std::thread::ThreadId;

  use crate::dispatch::Dispatch;
  use crate::dispatch::Scoped;
  use crate::dispatch::Serial;

  fn workers(count: usize) -> Scoped {
    Scoped::new(NonZeroUsize::new(count).unwrap())
  }

  fn check_order<D>(dispatch: &D)
  where
    D: Dispatch,
  {
    for lanes in [0, 1, 2, 7, 64, 1000, 1001] {
      let output: Vec<usize> = dispatch.dispatch(lanes, |lane| lane * 3);
      let expect: Vec<usize> = (0..lanes).map(|lane| lane * 3).collect();

      assert_eq!(output, expect, "lane results out of order for {lanes} lanes");
    }
  }

  fn check_once<D>(dispatch: &D)
  where
    D: Dispatch,
  {
    let count: AtomicUsize = AtomicUsize::new(0);
    let seen: Mutex<HashSet<usize>> = Mutex::new(HashSet::new());

    dispatch.dispatch(513, |lane| {
      count.fetch_add(1, Ordering::Relaxed);
      assert!(seen.lock().unwrap().insert(lane), "lane {lane} ran twice");
    });

    assert_eq!(count.load(Ordering::Relaxed), 513);
  }

  #[test]
  fn serial_order() {
    check_order(&Serial);
    check_once(&Serial);
  }

  #[test]
  fn scoped_order() {
    for count in [1, 2, 3, 8, 33] {
      check_order(&workers(count));
      check_once(&workers(count));
    }
  }

  #[test]
  fn scoped_uses_threads() {
    let ids: Vec<ThreadId> = workers(4).dispatch(4, |_| thread::current().id());
    let set: HashSet<ThreadId> = ids.into_iter().collect();

    assert_eq!(set.len(), 4);
    assert!(!set.contains(&thread::current().id()));
  }

  #[test]
  fn scoped_more_workers_than_lanes() {
    assert_eq!(workers(16).dispatch(3, |lane| lane), [0, 1, 2]);
  }

  #[test]
  #[should_panic(expected = "lane 5 failed")]
  fn scoped_propagates_panic() {
    workers(4).dispatch(8, |lane| {
      assert_ne!(lane, 5, "lane 5 failed");
    });
  }

  #[test]
  fn by_reference() {
    let dispatch: &Serial = &Serial;

    check_order(&dispatch);
  }

  #[cfg(feature = "rayon")]
  #[test]
  fn rayon_order() {
    use crate::dispatch::Rayon;

    check_order(&Rayon::global());
    check_once(&Rayon::global());

    let pool: rayon::ThreadPool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
    let rayon: Rayon = Rayon::with_pool(pool);

    check_order(&rayon);
    check_once(&rayon);
  }
}
