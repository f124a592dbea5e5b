// HashIndex unit test suite.
//
// Core invariants exercised:
// - Presence: lookup/contains/get agree with the inserted pairs until a
//   pair is overwritten or removed.
// - Absence is not an error: empty tables and missing keys yield the
//   caller's default, false, or None.
// - Capacity: powers of two only; growth at 90% load preserves every pair.
// - Layout: robin-hood displacement places colliding keys deterministically.
use stretchy::hash_index::INITIAL_CAPACITY;
use stretchy::HashIndex;

// Test: basic insert and lookup.
#[test]
fn insert_and_lookup() {
    let mut h = HashIndex::new();
    assert_eq!(h.count(), 0);
    h.insert(25, 1, &mut ()).unwrap();
    assert_eq!(h.count(), 1);
    assert_eq!(h.lookup(25, 0), 1);
    assert_eq!(h.capacity(), INITIAL_CAPACITY);
    h.free(&mut ());
}

// Test: removal.
// Verifies: count drops per removed key; removed keys are absent.
#[test]
fn remove_reduces_count() {
    let mut h = HashIndex::new();
    h.insert(25, 1, &mut ()).unwrap();
    h.insert(50, 2, &mut ()).unwrap();
    assert_eq!(h.count(), 2);
    assert_eq!(h.remove(25), Some(1));
    assert_eq!(h.count(), 1);
    assert!(!h.contains(25));
    assert_eq!(h.lookup(25, 7), 7);
    assert_eq!(h.remove(50), Some(2));
    assert_eq!(h.count(), 0);
    h.free(&mut ());
}

// Test: removing an absent key.
// Verifies: count unchanged.
#[test]
fn remove_absent_key_is_noop() {
    let mut h = HashIndex::new();
    h.insert(1, 1, &mut ()).unwrap();
    assert_eq!(h.remove(2), None);
    assert_eq!(h.count(), 1);
    h.free(&mut ());
}

#[test]
fn reports_containment() {
    let mut h = HashIndex::new();
    assert!(!h.contains(25));
    h.insert(25, 1, &mut ()).unwrap();
    assert!(h.contains(25));
    h.free(&mut ());
}

// Test: operations on an unallocated table.
// Verifies: no allocation, defaults returned.
#[test]
fn unallocated_table_reports_absence() {
    let mut h = HashIndex::new();
    assert_eq!(h.remove(1234), None);
    assert_eq!(h.count(), 0);
    assert_eq!(h.lookup(1, 0), 0);
    assert!(!h.contains(1234));
    assert_eq!(h.get(1), None);
    assert_eq!(h.capacity(), 0);
}

#[test]
fn lookup_returns_default_when_missing() {
    let mut h = HashIndex::new();
    h.insert(1, 1, &mut ()).unwrap();
    assert_eq!(h.lookup(2, 0), 0);
    assert!(!h.contains(2));
    h.free(&mut ());
}

// Test: reserve rounds up.
// Verifies: reserve(300) -> 512; smaller targets are no-ops.
#[test]
fn reserve_rounds_up_to_power_of_two() {
    let mut h = HashIndex::new();
    h.reserve(300, &mut ()).unwrap();
    assert_eq!(h.capacity(), 512);
    h.reserve(512, &mut ()).unwrap();
    h.reserve(100, &mut ()).unwrap();
    assert_eq!(h.capacity(), 512);
    h.free(&mut ());
}

// Test: reserve keeps existing pairs.
#[test]
fn reserve_rehashes_existing_pairs() {
    let mut h = HashIndex::new();
    for key in 1..=50 {
        h.insert(key, key + 1000, &mut ()).unwrap();
    }
    h.reserve(4000, &mut ()).unwrap();
    assert_eq!(h.capacity(), 4096);
    assert_eq!(h.count(), 50);
    for key in 1..=50 {
        assert_eq!(h.lookup(key, 0), key + 1000);
    }
    h.free(&mut ());
}

// Test: growth at the load factor.
// Verifies: 1..=63 fits in 128 slots; 1..=127 forces 256; every value survives.
#[test]
fn items_survive_growth() {
    let mut h = HashIndex::new();
    for key in 1..64 {
        h.insert(key, key, &mut ()).unwrap();
    }
    assert_eq!(h.capacity(), 128);
    for key in 64..128 {
        h.insert(key, key, &mut ()).unwrap();
    }
    assert_eq!(h.capacity(), 256);
    for key in 1..128 {
        assert_eq!(h.lookup(key, 0), key);
    }
    h.free(&mut ());
}

// Test: the growth threshold itself.
// Verifies: 115 entries (90% of 128) fit; the 116th insert doubles first.
#[test]
fn grows_exactly_at_ninety_percent() {
    let mut h = HashIndex::new();
    for key in 1..=115 {
        h.insert(key, key, &mut ()).unwrap();
    }
    assert_eq!(h.capacity(), 128);
    h.insert(116, 116, &mut ()).unwrap();
    assert_eq!(h.capacity(), 256);
    assert_eq!(h.count(), 116);
    h.free(&mut ());
}

// Test: robin-hood displacement.
// Verifies: with 1 and 129 colliding on bucket 1, 129 takes bucket 2 and
// pushes 2 on to bucket 3.
#[test]
fn insert_does_robin_hood_hashing() {
    let mut h = HashIndex::new();
    h.insert(1, 1, &mut ()).unwrap();
    h.insert(2, 2, &mut ()).unwrap();
    h.insert(129, 129, &mut ()).unwrap();
    assert_eq!(h.slot_keys()[1], 1);
    assert_eq!(h.slot_keys()[2], 129);
    assert_eq!(h.slot_keys()[3], 2);
    h.free(&mut ());
}

// Test: overwrite.
// Verifies: latest value wins; count unchanged.
#[test]
fn insert_overwrites() {
    let mut h = HashIndex::new();
    assert_eq!(h.insert(9, 1, &mut ()).unwrap(), None);
    assert_eq!(h.insert(9, 2, &mut ()).unwrap(), Some(1));
    assert_eq!(h.count(), 1);
    assert_eq!(h.lookup(9, 0), 2);
    h.free(&mut ());
}

// Test: free then reuse.
#[test]
fn free_resets_and_table_is_reusable() {
    let mut h = HashIndex::new();
    h.insert(3, 4, &mut ()).unwrap();
    h.free(&mut ());
    assert_eq!(h.capacity(), 0);
    assert_eq!(h.count(), 0);
    assert!(!h.contains(3));
    h.insert(3, 5, &mut ()).unwrap();
    assert_eq!(h.lookup(3, 0), 5);
    h.free(&mut ());
}

// Test: a caller-side store keyed through the index.
// Verifies: the storage-less pattern: key hash -> index into caller storage.
#[test]
fn maps_hashes_to_caller_storage() {
    let names = ["alpha", "beta", "gamma", "delta"];
    // FNV-1a with the low bit forced so no name hashes to the empty key.
    let hash = |s: &str| {
        s.bytes()
            .fold(2166136261u32, |acc, b| (acc ^ b as u32).wrapping_mul(16777619))
            | 1
    };

    let mut h = HashIndex::new();
    for (i, &name) in names.iter().enumerate() {
        h.insert(hash(name), i as u32, &mut ()).unwrap();
    }
    for name in names {
        let slot = h.lookup(hash(name), u32::MAX);
        assert_eq!(names[slot as usize], name);
    }
    assert_eq!(h.lookup(hash("epsilon"), u32::MAX), u32::MAX);
    h.free(&mut ());
}
