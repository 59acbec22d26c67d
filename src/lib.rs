//! A lock-free, fixed-capacity hash table for massively parallel batches.
//!
//! `simtab` provides [`SimTab`], an open-addressed table mapping `u32` keys to
//! `u32` values. It is built for workloads where thousands of workers each
//! perform one operation of a batch at the same time, using nothing but
//! per-slot compare-and-swap.
//!
//! # Overview
//!
//! Every slot holds a key and a value. Keys claim slots with a CAS and keep
//! them until the table is initialized again; deletes only replace the value
//! with a tombstone. Lookups can therefore stop at the first empty slot of a
//! probe sequence, even while other workers insert and delete.
//!
//! # Usage
//!
//! ```
//! use simtab::{SimTab, TOMBSTONE_VALUE};
//!
//! // Room for 1000 entries, rounded up to 1024 slots
//! let table = SimTab::new(1000);
//! assert_eq!(table.capacity(), 1024);
//!
//! // Insert and look up
//! table.insert(7, 700).unwrap();
//! assert_eq!(table.lookup(7), Some(700));
//!
//! // Deleted keys are still found, holding a tombstone
//! assert!(table.remove(7));
//! assert_eq!(table.lookup(7), Some(TOMBSTONE_VALUE));
//! assert_eq!(table.get(7), None);
//!
//! // Keys that were never inserted are absent
//! assert_eq!(table.lookup(8), None);
//! ```
//!
//! # Batches
//!
//! Batch operations run one lane per key through a [`Dispatch`]
//! implementation and return once every lane has completed. Consecutive
//! batches are therefore separated by a full barrier:
//!
//! ```
//! use simtab::{Scoped, SimTab};
//!
//! let dispatch = Scoped::available();
//! let mut table = SimTab::with_seed(1 << 12, 0x1234);
//!
//! let keys: Vec<u32> = (1..=4000).collect();
//! let values: Vec<u32> = keys.iter().map(|key| key * 2).collect();
//!
//! table.insert_batch(&dispatch, &keys, &values).unwrap();
//!
//! let found: Vec<Option<u32>> = table.lookup_batch(&dispatch, &keys);
//! assert!(found.iter().zip(&values).all(|(found, value)| *found == Some(*value)));
//!
//! table.delete_batch(&dispatch, &keys);
//! assert_eq!(table.len(), 0);
//!
//! // Start the next generation with a fresh seed
//! table.initialize(0x5678);
//! assert!(table.snapshot().is_reset());
//! ```
//!
//! A batch must not contain the same key twice. Within a batch, operations on
//! different keys are unordered.
//!
//! # Configuration
//!
//! The capacity and seed are chosen at runtime. The hash is selected at
//! compile time through the [`Params`] trait; the default configuration
//! ([`DefaultParams`]) uses the [murmur3 finalizer] over `key ^ seed`.
//!
//! ```
//! use simtab::{DefaultParams, SimTab};
//!
//! // These are equivalent:
//! let table1: SimTab = SimTab::new(64);
//! let table2: SimTab<DefaultParams> = SimTab::with_params(64, 0);
//! ```
//!
//! Capacity is always rounded up to the nearest power of two and clamped
//! to the range <code>[Capacity::MIN]..=[Capacity::MAX]</code>.
//!
//! # Capacity Limits
//!
//! The table never resizes. Once every slot on a key's probe sequence is
//! claimed by other keys, [`SimTab::insert()`] returns
//! [`Error::CapacityExceeded`] and leaves the table unchanged. Tombstones keep
//! their slots until the next initialize.
//!
//! # Memory Layout
//!
//! Slots are eight bytes and live in a single cache-line-aligned allocation.
//! The occupancy counters updated by every insert and delete sit on their own
//! cache line. See [`CACHE_LINE_SLOTS`] for the number of slots per line.
//!
//! # Features
//!
//! - `rayon` (default): the [`Rayon`] dispatcher.
//! - `logging`: batch summaries through the [`log`] facade.
//!
//! [Capacity::MAX]: crate::config::Capacity::MAX
//! [Capacity::MIN]: crate::config::Capacity::MIN
//! [`CACHE_LINE_SLOTS`]: crate::config::CACHE_LINE_SLOTS
//! [`DefaultParams`]: crate::config::DefaultParams
//! [`Params`]: crate::config::Params
//! [`SimTab::insert()`]: crate::public::SimTab::insert
//! [`Rayon`]: https://docs.rs/simtab/latest/simtab/struct.Rayon.html
//!
//! [murmur3 finalizer]: https://github.com/aappleby/smhasher/blob/master/src/MurmurHash3.cpp
//! [`log`]: https://docs.rs/log
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod array;
mod dispatch;
mod error;
mod params;
mod probe;
mod public;
mod slot;
mod snapshot;
mod table;
mod utils;
mod validate;

pub(crate) use crate::utils::alloc;
pub(crate) use crate::utils::sync;

pub mod implementation {
  #![doc = include_str!("../IMPLEMENTATION.md")]
}

pub mod config {
  //! Configuration parameters which can be used to override the default table
  //! settings.

  pub use crate::params::CACHE_LINE;
  pub use crate::params::CACHE_LINE_SLOTS;
  pub use crate::params::Capacity;
  pub use crate::params::DebugParams;
  pub use crate::params::DefaultParams;
  pub use crate::params::Params;
  pub use crate::params::ParamsExt;
  pub use crate::params::murmur3;
}

#[doc(inline)]
pub use self::config::Capacity;

#[doc(inline)]
pub use self::config::DefaultParams;

#[doc(inline)]
pub use self::config::Params;

#[cfg(feature = "rayon")]
pub use self::dispatch::Rayon;

pub use self::dispatch::Dispatch;
pub use self::dispatch::Scoped;
pub use self::dispatch::Serial;

pub use self::error::Error;

pub use self::public::SimTab;

pub use self::slot::EMPTY_KEY;
pub use self::slot::RawSlot;
pub use self::slot::TOMBSTONE_VALUE;

pub use self::snapshot::Snapshot;

pub use self::validate::Mismatch;
pub use self::validate::compare;
