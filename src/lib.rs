//! stretchy: stretchy-buffer arrays and a storage-less robin-hood hash
//! index sharing one pluggable allocation policy.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: two small building blocks whose only real logic is capacity
//!   growth and robin-hood probing, with every allocation and every broken
//!   precondition routed through a caller-supplied policy.
//! - Layers:
//!   - Config<C>: `Copy` record of allocate/release/assert callbacks plus a
//!     check policy. `C` is the caller's per-call context type.
//!   - RawBlock<T>: typed buffer allocated through a Config. The only place
//!     that builds a `Layout` or calls the callbacks.
//!   - Array<T, C>: growable `Copy` sequence over one RawBlock.
//!   - HashIndex<C>: `u32 -> u32` robin-hood table over two RawBlocks.
//!
//! Constraints
//! - Single-threaded: containers hold raw pointers and are `!Send`/`!Sync`.
//! - Allocation only on growth; removal never shrinks.
//! - The context `C` is passed as `&mut C` to each call that may allocate or
//!   release and is handed to the callbacks untouched.
//! - Precondition checks are always on, in release builds too, and fire
//!   before any state changes.
//!
//! Growth
//! - Array: `max(count + inc, 2 * capacity)` (see [`array::grown_capacity`]).
//!   `reserve(n)` grows only when `n > capacity` and then lands on
//!   `max(n, 2 * capacity)`.
//! - HashIndex: powers of two only. `insert` grows to
//!   `max(2 * capacity, 128)` once `count` reaches 90% of capacity;
//!   `reserve(n)` rounds `n` up to the next power of two.
//!
//! Failure semantics
//! - Underflow (`pop*`, `first`, `last`) and inserting key `0` call the
//!   assertion hook, then return `Err` under `CheckPolicy::Report` or panic
//!   under `CheckPolicy::Panic`.
//! - Absent keys are not errors: `lookup` returns the caller's default,
//!   `contains` returns false, `remove` returns `None`.
//! - An allocate callback returning `None` surfaces as `OutOfMemory`.
//!
//! Lifecycle
//! - `free(ctx)` returns storage through the policy with the caller's
//!   context. Dropping a container that still owns storage releases it with
//!   `C::default()` as context, so a counting context only balances when
//!   every container is freed.
//!
//! Notes and non-goals
//! - The hash index never stores real keys; collisions of caller hashes
//!   are the caller's problem.
//! - Iteration order of the hash index is slot order and carries no meaning.

pub mod array;
mod array_proptest;
mod error;
pub mod hash_index;
mod hash_index_proptest;
pub mod policy;
mod raw;

// Public surface
pub use array::Array;
pub use error::ContainerError;
pub use hash_index::HashIndex;
pub use policy::{AssertionFailure, CheckPolicy, Config};
