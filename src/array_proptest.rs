#![cfg(test)]

// Property tests for Array kept inside the crate so they can reach the
// growth policy alongside the public operations.

use crate::array::{grown_capacity, Array};
use crate::error::ContainerError;
use crate::policy::Config;
use core::alloc::Layout;
use core::panic::Location;
use core::ptr::NonNull;
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Clone, Debug)]
enum Op {
    PushBack(i32),
    PushFront(i32),
    PopBack,
    PopFront,
    PushBackN(Vec<i32>),
    PushFrontN(Vec<i32>),
    PopBackN(u32),
    PopFrontN(u32),
    Reserve(u32),
    ReserveMore(u32),
    Peek,
}

prop_compose! {
    fn arb_ops()(ops in proptest::collection::vec(
        prop_oneof![
            any::<i32>().prop_map(Op::PushBack),
            any::<i32>().prop_map(Op::PushFront),
            Just(Op::PopBack),
            Just(Op::PopFront),
            proptest::collection::vec(any::<i32>(), 0..8).prop_map(Op::PushBackN),
            proptest::collection::vec(any::<i32>(), 0..8).prop_map(Op::PushFrontN),
            (0u32..6).prop_map(Op::PopBackN),
            (0u32..6).prop_map(Op::PopFrontN),
            (0u32..64).prop_map(Op::Reserve),
            (0u32..16).prop_map(Op::ReserveMore),
            Just(Op::Peek),
        ], 1..120)) -> Vec<Op> { ops }
}

fn counting_alloc(
    layout: Layout,
    live: &mut i64,
    site: &'static Location<'static>,
) -> Option<NonNull<u8>> {
    *live += 1;
    crate::policy::default_alloc(layout, &mut (), site)
}

fn counting_release(
    ptr: NonNull<u8>,
    layout: Layout,
    live: &mut i64,
    site: &'static Location<'static>,
) {
    *live -= 1;
    crate::policy::default_release(ptr, layout, &mut (), site)
}

fn quiet(_: &crate::policy::AssertionFailure<'_>) {}

fn underflow(required: u32, count: usize) -> ContainerError {
    ContainerError::Underflow {
        required,
        count: count as u32,
    }
}

// State machine harness over Array against a VecDeque model.
proptest! {
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let config = Config::<i64> {
            alloc: counting_alloc,
            release: counting_release,
            assert_failed: quiet,
            ..Config::new()
        };
        let mut live = 0i64;
        let mut sut: Array<i32, i64> = Array::with_config(config);
        let mut model: VecDeque<i32> = VecDeque::new();

        for op in ops {
            let capacity_before = sut.capacity();
            match op {
                Op::PushBack(v) => {
                    sut.push_back(v, &mut live).unwrap();
                    model.push_back(v);
                }
                Op::PushFront(v) => {
                    sut.push_front(v, &mut live).unwrap();
                    model.push_front(v);
                }
                Op::PopBack => {
                    let expected = model.pop_back().ok_or_else(|| underflow(1, 0));
                    prop_assert_eq!(sut.pop_back(), expected);
                }
                Op::PopFront => {
                    let expected = model.pop_front().ok_or_else(|| underflow(1, 0));
                    prop_assert_eq!(sut.pop_front(), expected);
                }
                Op::PushBackN(items) => {
                    sut.push_back_n(&items, &mut live).unwrap();
                    model.extend(items);
                }
                Op::PushFrontN(items) => {
                    sut.push_front_n(&items, &mut live).unwrap();
                    for &v in items.iter().rev() {
                        model.push_front(v);
                    }
                }
                Op::PopBackN(n) => {
                    if (n as usize) <= model.len() {
                        prop_assert_eq!(sut.pop_back_n(n), Ok(()));
                        model.truncate(model.len() - n as usize);
                    } else {
                        prop_assert_eq!(sut.pop_back_n(n), Err(underflow(n, model.len())));
                    }
                }
                Op::PopFrontN(n) => {
                    if (n as usize) <= model.len() {
                        prop_assert_eq!(sut.pop_front_n(n), Ok(()));
                        model.drain(..n as usize).for_each(drop);
                    } else {
                        prop_assert_eq!(sut.pop_front_n(n), Err(underflow(n, model.len())));
                    }
                }
                Op::Reserve(n) => {
                    sut.reserve(n, &mut live).unwrap();
                    prop_assert!(sut.capacity() >= n);
                    if n <= capacity_before {
                        prop_assert_eq!(sut.capacity(), capacity_before);
                    }
                }
                Op::ReserveMore(n) => {
                    let needed = model.len() as u32 + n;
                    sut.reserve_more(n, &mut live).unwrap();
                    if needed <= capacity_before {
                        prop_assert_eq!(sut.capacity(), capacity_before);
                    } else {
                        prop_assert_eq!(
                            Ok(sut.capacity()),
                            grown_capacity(model.len() as u32, capacity_before, n)
                        );
                    }
                }
                Op::Peek => {
                    prop_assert_eq!(sut.first().ok(), model.front());
                    prop_assert_eq!(sut.last().ok(), model.back());
                }
            }

            // Post-conditions after each op
            prop_assert!(sut.capacity() >= capacity_before, "capacity never shrinks");
            prop_assert!(sut.count() <= sut.capacity());
            prop_assert_eq!(sut.count() as usize, model.len());
            prop_assert!(sut.iter().eq(model.iter()));
            prop_assert_eq!(live, if sut.capacity() > 0 { 1 } else { 0 });
        }

        sut.free(&mut live);
        prop_assert_eq!(live, 0);
        prop_assert_eq!(sut.capacity(), 0);
    }
}
