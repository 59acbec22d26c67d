//! Checks of batch results against expected values.

use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result;

#[cfg(feature = "logging")]
use crate::utils::log_debug;
#[cfg(feature = "logging")]
use crate::utils::log_warn;

/// A lane whose observed value differs from the expected one.
///
/// Produced by [`compare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mismatch {
  /// Position of the key in the batch.
  pub lane: usize,
  /// The key that was looked up.
  pub key: u32,
  /// The value the caller expected, `None` for an expected absence.
  pub expected: Option<u32>,
  /// The value the table returned.
  pub observed: Option<u32>,
}

impl Display for Mismatch {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "lane {}: key {} expected ", self.lane, self.key)?;
    write_value(f, self.expected)?;
    f.write_str(" observed ")?;
    write_value(f, self.observed)
  }
}

fn write_value(f: &mut Formatter<'_>, value: Option<u32>) -> Result {
  match value {
    Some(value) => write!(f, "{value}"),
    None => f.write_str("nothing"),
  }
}

/// Compares the results of a lookup batch against the expected values.
///
/// Lane `i` of `keys`, `expected`, and `observed` describe the same key.
/// Lanes beyond the shortest of the three slices are ignored. Every mismatch
/// is reported, in lane order.
///
/// # Examples
///
/// ```
/// use simtab::{Serial, SimTab, compare};
///
/// let table = SimTab::new(16);
/// let keys: [u32; 3] = [1, 2, 3];
///
/// table.insert_batch(&Serial, &keys, &[10, 20, 30]).unwrap();
/// table.insert(2, 21).unwrap();
///
/// let expected: [Option<u32>; 3] = [Some(10), Some(20), Some(30)];
/// let observed: Vec<Option<u32>> = table.lookup_batch(&Serial, &keys);
///
/// let mismatches = compare(&keys, &expected, &observed);
///
/// assert_eq!(mismatches.len(), 1);
/// assert_eq!(mismatches[0].lane, 1);
/// assert_eq!(mismatches[0].observed, Some(21));
/// ```
pub fn compare(keys: &[u32], expected: &[Option<u32>], observed: &[Option<u32>]) -> Vec<Mismatch> {
  let mismatches: Vec<Mismatch> = keys
    .iter()
    .zip(expected)
    .zip(observed)
    .enumerate()
    .filter(|(_, ((_, expected), observed))| expected != observed)
    .map(|(lane, ((key, expected), observed))| Mismatch {
      lane,
      key: *key,
      expected: *expected,
      observed: *observed,
    })
    .collect();

  #[cfg(feature = "logging")]
  report(keys.len(), &mismatches);

  mismatches
}

#[cfg(feature = "logging")]
fn report(lanes: usize, mismatches: &[Mismatch]) {
  if mismatches.is_empty() {
    log_debug!("validated {} lanes", lanes);
    return;
  }

  log_warn!("{} of {} lanes mismatched", mismatches.len(), lanes);

  for mismatch in mismatches {
    log_warn!("{}", mismatch);
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
