#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use loom::thread::JoinHandle;
use std::ops::Deref;

use simtab::Capacity;
use simtab::Error;
use simtab::Params;
use simtab::SimTab;
use simtab::TOMBSTONE_VALUE;

type Insert = JoinHandle<Result<(), Error>>;
type Remove = JoinHandle<bool>;
type Lookup = JoinHandle<Option<u32>>;

/// Sends every key to slot 0, so every operation contends on the same chain.
struct Collide;

impl Params for Collide {
  fn hash(_key: u32, _seed: u32) -> u32 {
    0
  }
}

type ArcTable = Arc<SimTab<Collide>>;

struct LoomTable {
  inner: ArcTable,
}

impl LoomTable {
  fn new(capacity: u32) -> Self {
    Self {
      inner: Arc::new(SimTab::from_capacity(Capacity::new(capacity), 0)),
    }
  }

  fn spawn_insert(&self, key: u32, value: u32) -> Insert {
    let table: ArcTable = ArcTable::clone(&self.inner);
    thread::spawn(move || table.insert(key, value))
  }

  fn spawn_remove(&self, key: u32) -> Remove {
    let table: ArcTable = ArcTable::clone(&self.inner);
    thread::spawn(move || table.remove(key))
  }

  fn spawn_lookup(&self, key: u32) -> Lookup {
    let table: ArcTable = ArcTable::clone(&self.inner);
    thread::spawn(move || table.lookup(key))
  }
}

impl Deref for LoomTable {
  type Target = ArcTable;

  #[inline]
  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

#[test]
fn test_insert_distinct() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    let thread_a: Insert = table.spawn_insert(1, 10);
    let thread_b: Insert = table.spawn_insert(2, 20);

    assert_eq!(thread_a.join().unwrap(), Ok(()));
    assert_eq!(thread_b.join().unwrap(), Ok(()));

    assert_eq!(table.lookup(1), Some(10));
    assert_eq!(table.lookup(2), Some(20));
    assert_eq!(table.len(), 2);
    assert!(table.snapshot().is_unique());
  });
}

#[test]
fn test_insert_same_key() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    let thread_a: Insert = table.spawn_insert(7, 1);
    let thread_b: Insert = table.spawn_insert(7, 2);

    assert_eq!(thread_a.join().unwrap(), Ok(()));
    assert_eq!(thread_b.join().unwrap(), Ok(()));

    // Last writer wins, but the key only ever claims one slot.
    let value: Option<u32> = table.lookup(7);

    assert!(value == Some(1) || value == Some(2));
    assert_eq!(table.len(), 1);
    assert_eq!(table.claimed(), 1);
    assert_eq!(table.snapshot().occupied(), 1);
  });
}

#[test]
fn test_capacity_race() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    table.insert(1, 10).unwrap();

    let insert_a: Insert = table.spawn_insert(2, 20);
    let insert_b: Insert = table.spawn_insert(3, 30);

    let result_a: Result<(), Error> = insert_a.join().unwrap();
    let result_b: Result<(), Error> = insert_b.join().unwrap();

    assert!(result_a.is_ok() != result_b.is_ok(), "exactly one insert should succeed");

    let error: Error = result_a.and(result_b).unwrap_err();

    assert!(error.is_capacity_exceeded());

    assert_eq!(table.lookup(1), Some(10));
    assert_eq!(table.claimed(), 2);
  });
}

#[test]
fn test_insert_lookup() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    table.insert(1, 10).unwrap();

    let insert: Insert = table.spawn_insert(2, 20);
    let lookup: Lookup = table.spawn_lookup(1);

    assert_eq!(insert.join().unwrap(), Ok(()));
    assert_eq!(lookup.join().unwrap(), Some(10));
    assert_eq!(table.lookup(2), Some(20));
  });
}

#[test]
fn test_remove_race() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    table.insert(5, 50).unwrap();

    let remove_a: Remove = table.spawn_remove(5);
    let remove_b: Remove = table.spawn_remove(5);

    let removed_a: bool = remove_a.join().unwrap();
    let removed_b: bool = remove_b.join().unwrap();

    assert!(removed_a != removed_b, "exactly one remove should succeed");
    assert_eq!(table.lookup(5), Some(TOMBSTONE_VALUE));
    assert_eq!(table.len(), 0);
  });
}

#[test]
fn test_remove_lookup() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    table.insert(5, 50).unwrap();

    let remove: Remove = table.spawn_remove(5);
    let lookup: Lookup = table.spawn_lookup(5);

    assert!(remove.join().unwrap());

    let value: Option<u32> = lookup.join().unwrap();

    assert!(value == Some(50) || value == Some(TOMBSTONE_VALUE));
  });
}

#[test]
fn test_remove_passes_other_tombstone() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    table.insert(1, 10).unwrap();
    table.insert(2, 20).unwrap();

    let remove: Remove = table.spawn_remove(1);
    let lookup: Lookup = table.spawn_lookup(2);

    assert!(remove.join().unwrap());
    assert_eq!(lookup.join().unwrap(), Some(20));
  });
}

#[test]
fn test_reinsert_remove() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(2);

    table.insert(9, 1).unwrap();
    assert!(table.remove(9));

    let insert: Insert = table.spawn_insert(9, 2);
    let remove: Remove = table.spawn_remove(9);

    assert_eq!(insert.join().unwrap(), Ok(()));

    // Either the delete ran first and saw a tombstone, or it deleted the
    // revived value. The counter matches the slot in both orders.
    if remove.join().unwrap() {
      assert_eq!(table.lookup(9), Some(TOMBSTONE_VALUE));
      assert_eq!(table.len(), 0);
    } else {
      assert_eq!(table.lookup(9), Some(2));
      assert_eq!(table.len(), 1);
    }

    assert_eq!(table.claimed(), 1);
  });
}

#[test]
fn test_length_consistency() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new(4);

    let thread_a: JoinHandle<()> = {
      let table: ArcTable = ArcTable::clone(&table.inner);

      thread::spawn(move || {
        table.insert(1, 1).unwrap();
        table.insert(2, 2).unwrap();
      })
    };

    let thread_b: Insert = table.spawn_insert(3, 3);

    thread_a.join().unwrap();
    thread_b.join().unwrap().unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.claimed(), 3);
  });
}
