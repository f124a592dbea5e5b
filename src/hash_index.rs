//! HashIndex: storage-less robin-hood table of `u32` key/value slots.
//!
//! The table stores key hashes and value indices only; callers keep the
//! real keys and payloads elsewhere. Slots live in two parallel blocks of
//! `capacity` entries, where `capacity` is 0 or a power of two. Key `0`
//! marks an empty slot and is never insertable.
//!
//! Probing is linear from the ideal bucket `key & mask`. Insertion swaps
//! the incoming entry with any occupant that sits closer to its own ideal
//! bucket, which keeps probe runs short and lets lookups stop as soon as
//! they have probed farther than the occupant in front of them. Removal
//! shifts the rest of the run back by one instead of leaving tombstones.

use crate::error::ContainerError;
use crate::policy::Config;
use crate::raw::RawBlock;
use core::fmt;
use core::mem;
use core::panic::Location;

/// Capacity of the first allocation made by `insert`.
pub const INITIAL_CAPACITY: u32 = 128;

/// Occupancy, in percent of capacity, at which `insert` grows the table.
pub const LOAD_FACTOR_PERCENT: u32 = 90;

const EMPTY: u32 = 0;

/// Steps from `key`'s ideal bucket to `index`, modulo capacity.
#[inline]
fn probe_distance(key: u32, index: u32, mask: u32) -> u32 {
    index.wrapping_sub(key & mask) & mask
}

/// Robin-hood insertion into zero-initialized or live slot arrays.
/// Returns the previous value when `key` was already present.
fn place(keys: &mut [u32], values: &mut [u32], mut key: u32, mut value: u32) -> Option<u32> {
    let mask = keys.len() as u32 - 1;
    let mut index = key & mask;
    let mut distance = 0;
    loop {
        let slot = index as usize;
        let current = keys[slot];
        if current == EMPTY {
            keys[slot] = key;
            values[slot] = value;
            return None;
        }
        // A carried, displaced entry is unique, so this only fires for the
        // caller's key.
        if current == key {
            return Some(mem::replace(&mut values[slot], value));
        }
        let existing = probe_distance(current, index, mask);
        if existing < distance {
            keys[slot] = key;
            key = current;
            value = mem::replace(&mut values[slot], value);
            distance = existing;
        }
        index = (index + 1) & mask;
        distance += 1;
    }
}

/// Robin-hood table of `u32 -> u32` slots. Payloads live with the caller;
/// key `0` marks an empty slot and can not be inserted.
///
/// As with [`Array`](crate::Array), call [`free`](Self::free) with the
/// caller's context before dropping; `Drop` releases with `C::default()`.
pub struct HashIndex<C: Default = ()> {
    keys: RawBlock<u32>,
    values: RawBlock<u32>,
    count: u32,
    config: Config<C>,
}

impl HashIndex {
    /// Unallocated table on the global heap.
    pub fn new() -> Self {
        Self::with_config(Config::new())
    }
}

impl<C: Default> Default for HashIndex<C> {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<C: Default> HashIndex<C> {
    /// Unallocated table allocating through `config`. The first insert
    /// allocates `INITIAL_CAPACITY` slots.
    pub fn with_config(config: Config<C>) -> Self {
        Self {
            keys: RawBlock::empty(),
            values: RawBlock::empty(),
            count: 0,
            config,
        }
    }

    pub fn config(&self) -> &Config<C> {
        &self.config
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of slots; 0 until the first allocation.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.keys.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Raw key slots; `0` marks an empty slot.
    pub fn slot_keys(&self) -> &[u32] {
        // SAFETY: key slots are zero-filled on allocation.
        unsafe { self.keys.slice(self.keys.capacity()) }
    }

    /// Raw value slots, parallel to [`slot_keys`](Self::slot_keys).
    pub fn slot_values(&self) -> &[u32] {
        // SAFETY: value slots are zero-filled on allocation.
        unsafe { self.values.slice(self.values.capacity()) }
    }

    fn slots_mut(&mut self) -> (&mut [u32], &mut [u32]) {
        let capacity = self.keys.capacity();
        // SAFETY: both blocks hold `capacity` initialized slots.
        unsafe { (self.keys.slice_mut(capacity), self.values.slice_mut(capacity)) }
    }

    /// Occupied `(key, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.slot_keys()
            .iter()
            .zip(self.slot_values())
            .filter(|&(&k, _)| k != EMPTY)
            .map(|(&k, &v)| (k, v))
    }

    /// Grows to the smallest power of two `>= min_capacity` and rehashes.
    /// No-op when the table is already large enough.
    #[track_caller]
    pub fn reserve(&mut self, min_capacity: u32, ctx: &mut C) -> Result<(), ContainerError> {
        if min_capacity <= self.capacity() {
            return Ok(());
        }
        let capacity = min_capacity
            .checked_next_power_of_two()
            .ok_or(ContainerError::CapacityOverflow)?;
        self.rehash(capacity, ctx)
    }

    /// Inserts `key -> value`, returning the previous value on overwrite.
    ///
    /// Grows to `max(2 * capacity, INITIAL_CAPACITY)` first when the table
    /// has reached its load factor.
    #[track_caller]
    pub fn insert(
        &mut self,
        key: u32,
        value: u32,
        ctx: &mut C,
    ) -> Result<Option<u32>, ContainerError> {
        if key == EMPTY {
            let err = ContainerError::ReservedKey;
            self.config
                .report("key != 0", &err.to_string(), Location::caller());
            return Err(err);
        }
        let threshold = u64::from(self.capacity()) * u64::from(LOAD_FACTOR_PERCENT) / 100;
        if u64::from(self.count) >= threshold {
            let doubled = self
                .capacity()
                .checked_mul(2)
                .ok_or(ContainerError::CapacityOverflow)?;
            self.rehash(doubled.max(INITIAL_CAPACITY), ctx)?;
        }
        let (keys, values) = self.slots_mut();
        let previous = place(keys, values, key, value);
        if previous.is_none() {
            self.count += 1;
        }
        Ok(previous)
    }

    /// Stored value for `key`, or `default_value` when absent.
    pub fn lookup(&self, key: u32, default_value: u32) -> u32 {
        self.get(key).unwrap_or(default_value)
    }

    /// Stored value for `key`.
    pub fn get(&self, key: u32) -> Option<u32> {
        self.find_slot(key).map(|slot| self.slot_values()[slot])
    }

    /// Always false for key `0`.
    pub fn contains(&self, key: u32) -> bool {
        self.find_slot(key).is_some()
    }

    /// Removes `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&mut self, key: u32) -> Option<u32> {
        let slot = self.find_slot(key)?;
        let mask = self.capacity() - 1;
        let (keys, values) = self.slots_mut();
        let removed = values[slot];

        // Backward shift: pull each displaced follower one slot closer to
        // its ideal bucket until the run ends.
        let mut hole = slot as u32;
        loop {
            let next = (hole + 1) & mask;
            let follower = keys[next as usize];
            if follower == EMPTY || probe_distance(follower, next, mask) == 0 {
                break;
            }
            keys[hole as usize] = follower;
            values[hole as usize] = values[next as usize];
            hole = next;
        }
        keys[hole as usize] = EMPTY;

        self.count -= 1;
        Some(removed)
    }

    /// Releases the slot storage and resets to an unallocated table.
    #[track_caller]
    pub fn free(&mut self, ctx: &mut C) {
        self.keys.release(&self.config, ctx);
        self.values.release(&self.config, ctx);
        self.count = 0;
    }

    fn find_slot(&self, key: u32) -> Option<usize> {
        let capacity = self.capacity();
        if capacity == 0 || key == EMPTY {
            return None;
        }
        let keys = self.slot_keys();
        let mask = capacity - 1;
        let mut index = key & mask;
        let mut distance = 0;
        loop {
            let current = keys[index as usize];
            if current == key {
                return Some(index as usize);
            }
            if current == EMPTY {
                return None;
            }
            // Probed past the occupant's own distance: `key` would have
            // displaced it on insert.
            if distance > probe_distance(current, index, mask) {
                return None;
            }
            index = (index + 1) & mask;
            distance += 1;
        }
    }

    #[track_caller]
    fn rehash(&mut self, new_capacity: u32, ctx: &mut C) -> Result<(), ContainerError> {
        debug_assert!(new_capacity.is_power_of_two());
        let mut keys = RawBlock::allocate_zeroed(new_capacity, &self.config, ctx)?;
        let mut values = match RawBlock::allocate_zeroed(new_capacity, &self.config, ctx) {
            Ok(values) => values,
            Err(err) => {
                keys.release(&self.config, ctx);
                return Err(err);
            }
        };

        // SAFETY: both new blocks are zero-filled to `new_capacity`.
        let (new_keys, new_values) =
            unsafe { (keys.slice_mut(new_capacity), values.slice_mut(new_capacity)) };
        for (&k, &v) in self.slot_keys().iter().zip(self.slot_values()) {
            if k != EMPTY {
                place(new_keys, new_values, k, v);
            }
        }

        let old_capacity = self.capacity();
        mem::swap(&mut self.keys, &mut keys);
        mem::swap(&mut self.values, &mut values);
        keys.release(&self.config, ctx);
        values.release(&self.config, ctx);
        tracing::trace!(
            from = old_capacity,
            to = new_capacity,
            count = self.count,
            "hash index rehashed"
        );
        Ok(())
    }

    /// Panics unless every occupied slot sits in an unbroken run from its
    /// ideal bucket with robin-hood ordering.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let capacity = self.capacity();
        let keys = self.slot_keys();
        assert!(capacity == 0 || capacity.is_power_of_two());
        let occupied = keys.iter().filter(|&&k| k != EMPTY).count();
        assert_eq!(occupied as u32, self.count, "count matches occupied slots");
        if capacity == 0 {
            return;
        }
        let mask = capacity - 1;
        for (index, &key) in keys.iter().enumerate() {
            if key == EMPTY {
                continue;
            }
            let index = index as u32;
            let distance = probe_distance(key, index, mask);
            if distance == 0 {
                continue;
            }
            let prev = (index + capacity - 1) & mask;
            let prev_key = keys[prev as usize];
            assert_ne!(prev_key, EMPTY, "gap inside probe run of key {key}");
            assert!(
                probe_distance(prev_key, prev, mask) + 1 >= distance,
                "key {key} at distance {distance} follows a richer slot"
            );
            assert_eq!(self.find_slot(key), Some(index as usize));
        }
    }
}

impl<C: Default> Drop for HashIndex<C> {
    fn drop(&mut self) {
        if self.capacity() > 0 {
            tracing::debug!(
                capacity = self.capacity(),
                "hash index dropped while allocated; releasing with a default context"
            );
            let config = self.config;
            let mut ctx = C::default();
            self.keys.release(&config, &mut ctx);
            self.values.release(&config, &mut ctx);
        }
    }
}

impl<C: Default> fmt::Debug for HashIndex<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
