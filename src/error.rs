//! Errors reported by table operations.

/// The error type for insert operations and insert batches.
///
/// Lookups and deletes of absent keys are not errors; they return `None` and
/// `false` respectively. No error leaves the table in a corrupted state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
  /// Every slot on the key's probe sequence holds a different key.
  ///
  /// The table is unchanged by the failed insert. Initialize and retry the
  /// batch with a larger capacity to recover.
  #[error("no free slot for key {key} in a table of {capacity} slots")]
  CapacityExceeded { key: u32, capacity: u32 },

  /// The key equals [`EMPTY_KEY`], which marks unclaimed slots.
  ///
  /// [`EMPTY_KEY`]: crate::EMPTY_KEY
  #[error("key 0 is reserved for empty slots")]
  ReservedKey,

  /// The value equals [`TOMBSTONE_VALUE`], which marks deleted keys.
  ///
  /// [`TOMBSTONE_VALUE`]: crate::TOMBSTONE_VALUE
  #[error("value 0xFFFFFFFF for key {key} is reserved for deleted entries")]
  ReservedValue { key: u32 },

  /// An insert batch was given a different number of keys and values.
  ///
  /// Reported before any lane runs.
  #[error("insert batch has {keys} keys but {values} values")]
  LengthMismatch { keys: usize, values: usize },

  /// Some lanes of an insert batch failed.
  ///
  /// Lanes not listed in `failures` completed their insert.
  #[error("{} of {lanes} insert lanes failed", .failures.len())]
  Batch {
    lanes: usize,
    failures: Vec<(usize, Error)>,
  },
}

impl Error {
  /// Returns `true` if this error, or any failed lane of a batch, ran out of
  /// slots.
  pub fn is_capacity_exceeded(&self) -> bool {
    match self {
      Self::CapacityExceeded { .. } => true,
      Self::Batch { failures, .. } => failures.iter().any(|(_, error)| error.is_capacity_exceeded()),
      _ => false,
    }
  }
}
