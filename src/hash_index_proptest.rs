#![cfg(test)]

// Property tests for HashIndex kept inside the crate so they can check the
// slot layout after every step.

use crate::hash_index::{HashIndex, INITIAL_CAPACITY};
use hashbrown::HashMap;
use proptest::prelude::*;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, u32),
    Remove(u32),
    Lookup(u32),
    Contains(u32),
    Reserve(u32),
    Iterate,
}

// Small key spaces force long collision runs; the high-bit variant maps
// many keys onto the same bucket.
prop_compose! {
    fn arb_key()(k in prop_oneof![1u32..64, (1u32..8).prop_map(|k| k << 7 | 3), 1u32..=u32::MAX]) -> u32 { k }
}

prop_compose! {
    fn arb_ops()(ops in proptest::collection::vec(
        prop_oneof![
            4 => (arb_key(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => arb_key().prop_map(Op::Remove),
            1 => arb_key().prop_map(Op::Lookup),
            1 => arb_key().prop_map(Op::Contains),
            1 => (0u32..600).prop_map(Op::Reserve),
            1 => Just(Op::Iterate),
        ], 1..300)) -> Vec<Op> { ops }
}

// State machine harness over HashIndex against a hashbrown::HashMap model.
proptest! {
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let mut sut = HashIndex::new();
        let mut model: HashMap<u32, u32> = HashMap::new();

        for op in ops {
            let capacity_before = sut.capacity();
            match op {
                Op::Insert(k, v) => {
                    let grows = sut.count() >= sut.capacity() * 9 / 10;
                    let previous = sut.insert(k, v, &mut ()).unwrap();
                    prop_assert_eq!(previous, model.insert(k, v));
                    if grows {
                        prop_assert_eq!(sut.capacity(), (capacity_before * 2).max(INITIAL_CAPACITY));
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(k), model.remove(&k));
                    prop_assert!(!sut.contains(k));
                }
                Op::Lookup(k) => {
                    let expected = model.get(&k).copied().unwrap_or(0xdead);
                    prop_assert_eq!(sut.lookup(k, 0xdead), expected);
                }
                Op::Contains(k) => {
                    prop_assert_eq!(sut.contains(k), model.contains_key(&k));
                }
                Op::Reserve(n) => {
                    sut.reserve(n, &mut ()).unwrap();
                    if n > capacity_before {
                        prop_assert_eq!(sut.capacity(), n.next_power_of_two());
                    } else {
                        prop_assert_eq!(sut.capacity(), capacity_before);
                    }
                }
                Op::Iterate => {
                    let s: BTreeSet<_> = sut.iter().collect();
                    let m: BTreeSet<_> = model.iter().map(|(&k, &v)| (k, v)).collect();
                    prop_assert_eq!(s, m);
                }
            }

            // Post-conditions after each op
            sut.check_invariants();
            prop_assert_eq!(sut.count() as usize, model.len());
            prop_assert!(sut.capacity() >= capacity_before, "capacity never shrinks");
            prop_assert!(sut.capacity() == 0 || sut.capacity().is_power_of_two());
            prop_assert!(sut.count() < sut.capacity() || sut.capacity() == 0);
        }

        for (&k, &v) in model.iter() {
            prop_assert_eq!(sut.get(k), Some(v));
        }
        sut.free(&mut ());
        prop_assert_eq!(sut.capacity(), 0);
        prop_assert!(sut.is_empty());
    }
}
