use std::collections::HashSet;

use divan::Bencher;
use divan::bench;
use divan::bench_group;
use divan::black_box;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use simtab::Dispatch;
use simtab::Rayon;
use simtab::Scoped;
use simtab::Serial;
use simtab::SimTab;

const OPS: &[u32] = &[1 << 8, 1 << 10, 1 << 12, 1 << 14, 1 << 16, 1 << 18];

// -----------------------------------------------------------------------------
// Shared Setup
// -----------------------------------------------------------------------------

/// Distinct random keys, never `EMPTY_KEY`.
fn random_keys(ops: u32) -> Vec<u32> {
  let mut rng: StdRng = StdRng::seed_from_u64(u64::from(ops));
  let mut seen: HashSet<u32> = HashSet::with_capacity(ops as usize);

  while seen.len() < ops as usize {
    seen.insert(rng.random_range(1..u32::MAX));
  }

  seen.into_iter().collect()
}

/// A table at a load factor of one half.
fn sized(ops: u32) -> SimTab {
  SimTab::with_seed(ops * 2, 0x9E37_79B9)
}

fn filled<D>(dispatch: &D, keys: &[u32]) -> SimTab
where
  D: Dispatch,
{
  let table: SimTab = sized(keys.len() as u32);

  table.insert_batch(dispatch, keys, keys).unwrap();
  table
}

// -----------------------------------------------------------------------------
// Actual Benchmarks
// -----------------------------------------------------------------------------

#[bench_group(name = "Insert", skip_ext_time)]
mod insert {
  use super::bench;
  use super::*;

  fn bench<D>(bencher: Bencher<'_, '_>, dispatch: D, ops: u32)
  where
    D: Dispatch + Sync,
  {
    let keys: Vec<u32> = random_keys(ops);

    bencher
      .counter(ops as usize)
      .with_inputs(|| sized(ops))
      .bench_local_refs(|table: &mut SimTab| {
        black_box(table.insert_batch(&dispatch, black_box(&keys), &keys)).unwrap();
      });
  }

  #[bench(args = OPS)]
  fn serial(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Serial, ops);
  }

  #[bench(args = OPS)]
  fn scoped(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Scoped::available(), ops);
  }

  #[bench(args = OPS)]
  fn rayon(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Rayon::global(), ops);
  }
}

#[bench_group(name = "Lookup", skip_ext_time)]
mod lookup {
  use super::bench;
  use super::*;

  fn bench<D>(bencher: Bencher<'_, '_>, dispatch: D, ops: u32)
  where
    D: Dispatch + Sync,
  {
    let keys: Vec<u32> = random_keys(ops);
    let table: SimTab = filled(&dispatch, &keys);

    bencher.counter(ops as usize).bench(|| {
      let found: Vec<Option<u32>> = table.lookup_batch(&dispatch, black_box(&keys));
      black_box(found)
    });
  }

  #[bench(args = OPS)]
  fn serial(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Serial, ops);
  }

  #[bench(args = OPS)]
  fn scoped(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Scoped::available(), ops);
  }

  #[bench(args = OPS)]
  fn rayon(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Rayon::global(), ops);
  }
}

#[bench_group(name = "Delete", skip_ext_time)]
mod delete {
  use super::bench;
  use super::*;

  fn bench<D>(bencher: Bencher<'_, '_>, dispatch: D, ops: u32)
  where
    D: Dispatch + Sync,
  {
    let keys: Vec<u32> = random_keys(ops);

    bencher
      .counter(ops as usize)
      .with_inputs(|| filled(&dispatch, &keys))
      .bench_local_refs(|table: &mut SimTab| {
        let removed: Vec<bool> = table.delete_batch(&dispatch, black_box(&keys));
        black_box(removed)
      });
  }

  #[bench(args = OPS)]
  fn serial(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Serial, ops);
  }

  #[bench(args = OPS)]
  fn scoped(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Scoped::available(), ops);
  }

  #[bench(args = OPS)]
  fn rayon(bencher: Bencher<'_, '_>, ops: u32) {
    bench(bencher, Rayon::global(), ops);
  }
}

#[bench_group(name = "Initialize", skip_ext_time)]
mod initialize {
  use super::bench;
  use super::*;

  #[bench(args = OPS)]
  fn exclusive(bencher: Bencher<'_, '_>, ops: u32) {
    bencher
      .counter(ops as usize * 2)
      .with_inputs(|| filled(&Serial, &random_keys(ops)))
      .bench_local_refs(|table: &mut SimTab| table.initialize(black_box(1)));
  }

  #[bench(args = OPS)]
  fn rayon(bencher: Bencher<'_, '_>, ops: u32) {
    let dispatch: Rayon = Rayon::global();

    bencher
      .counter(ops as usize * 2)
      .with_inputs(|| filled(&Serial, &random_keys(ops)))
      .bench_local_refs(|table: &mut SimTab| table.initialize_with(&dispatch, black_box(1)));
  }
}

// -----------------------------------------------------------------------------
// Main
// -----------------------------------------------------------------------------

fn main() {
  divan::main();
}
