//! Array: a stretchy buffer over a policy-allocated block.
//!
//! The `{capacity, count}` header lives next to the block pointer in the
//! owning value instead of in front of the elements. A fresh array owns no
//! storage. Growth follows [`grown_capacity`]: at least double, never less
//! than the immediate request. Every relocation copies the live elements
//! into the new block before the old one is released.
//!
//! Elements are `Copy`: insertion and removal move raw bytes and nothing
//! is ever dropped in place.

use crate::error::ContainerError;
use crate::policy::Config;
use crate::raw::RawBlock;
use core::fmt;
use core::ops::{Deref, DerefMut};
use core::panic::Location;
use core::ptr;

/// Capacity after growing an array holding `count` of `capacity` elements
/// so that `inc` more elements fit: `max(count + inc, 2 * capacity)`.
pub fn grown_capacity(count: u32, capacity: u32, inc: u32) -> Result<u32, ContainerError> {
    let required = count
        .checked_add(inc)
        .ok_or(ContainerError::CapacityOverflow)?;
    Ok(required.max(capacity.saturating_mul(2)))
}

/// Growable sequence of `Copy` elements allocated through a [`Config`].
///
/// Operations that may allocate or release take the caller's context as
/// `ctx`. Call [`free`](Self::free) before dropping: `Drop` can only release
/// with `C::default()`, which a counting context never sees.
pub struct Array<T: Copy, C: Default = ()> {
    block: RawBlock<T>,
    count: u32,
    config: Config<C>,
}

impl<T: Copy> Array<T> {
    /// Empty array on the global heap. Allocates nothing.
    pub fn new() -> Self {
        Self::with_config(Config::new())
    }
}

impl<T: Copy, C: Default> Default for Array<T, C> {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<T: Copy, C: Default> Array<T, C> {
    /// Empty array allocating through `config`.
    pub fn with_config(config: Config<C>) -> Self {
        Self {
            block: RawBlock::empty(),
            count: 0,
            config,
        }
    }

    pub fn config(&self) -> &Config<C> {
        &self.config
    }

    /// Number of live elements.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Elements that fit before the next relocation.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.block.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: elements [0, count) are initialized and count <= capacity.
        unsafe { self.block.slice(self.count) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`.
        unsafe { self.block.slice_mut(self.count) }
    }

    /// Ensures `capacity() >= min_capacity`. Never shrinks and never
    /// reallocates when the capacity already suffices; a grow lands on
    /// `max(min_capacity, 2 * capacity())`.
    #[track_caller]
    pub fn reserve(&mut self, min_capacity: u32, ctx: &mut C) -> Result<(), ContainerError> {
        if min_capacity > self.capacity() {
            // count + (min_capacity - count) == min_capacity in the growth policy.
            self.grow(min_capacity - self.count, ctx)?;
        }
        Ok(())
    }

    /// Ensures room for `extra` more elements, growing only on demand.
    #[track_caller]
    pub fn reserve_more(&mut self, extra: u32, ctx: &mut C) -> Result<(), ContainerError> {
        self.maybe_grow(extra, ctx)
    }

    #[track_caller]
    pub fn push_back(&mut self, value: T, ctx: &mut C) -> Result<(), ContainerError> {
        self.maybe_grow(1, ctx)?;
        // SAFETY: count < capacity after growing.
        unsafe { self.block.as_ptr().add(self.count as usize).write(value) };
        self.count += 1;
        Ok(())
    }

    /// Removes and returns the last element.
    #[track_caller]
    pub fn pop_back(&mut self) -> Result<T, ContainerError> {
        self.check_min_count(1)?;
        self.count -= 1;
        // SAFETY: the slot at the old `count - 1` is initialized.
        Ok(unsafe { self.block.as_ptr().add(self.count as usize).read() })
    }

    /// Inserts at index 0, shifting the run up by one.
    #[track_caller]
    pub fn push_front(&mut self, value: T, ctx: &mut C) -> Result<(), ContainerError> {
        self.maybe_grow(1, ctx)?;
        let p = self.block.as_ptr();
        // SAFETY: count + 1 <= capacity; `copy` handles the overlap.
        unsafe {
            ptr::copy(p, p.add(1), self.count as usize);
            p.write(value);
        }
        self.count += 1;
        Ok(())
    }

    /// Removes and returns element 0, shifting the run down by one.
    #[track_caller]
    pub fn pop_front(&mut self) -> Result<T, ContainerError> {
        self.check_min_count(1)?;
        let p = self.block.as_ptr();
        // SAFETY: count >= 1, so [0, count) is initialized.
        let value = unsafe {
            let value = p.read();
            ptr::copy(p.add(1), p, self.count as usize - 1);
            value
        };
        self.count -= 1;
        Ok(value)
    }

    /// Appends `items` in order.
    #[track_caller]
    pub fn push_back_n(&mut self, items: &[T], ctx: &mut C) -> Result<(), ContainerError> {
        let n = Self::len_u32(items)?;
        self.maybe_grow(n, ctx)?;
        // SAFETY: count + n <= capacity; `items` can not alias our block
        // while we hold `&mut self`.
        unsafe {
            ptr::copy_nonoverlapping(
                items.as_ptr(),
                self.block.as_ptr().add(self.count as usize),
                items.len(),
            );
        }
        self.count += n;
        Ok(())
    }

    /// Inserts `items` in order at the front.
    #[track_caller]
    pub fn push_front_n(&mut self, items: &[T], ctx: &mut C) -> Result<(), ContainerError> {
        let n = Self::len_u32(items)?;
        self.maybe_grow(n, ctx)?;
        let p = self.block.as_ptr();
        // SAFETY: count + n <= capacity.
        unsafe {
            ptr::copy(p, p.add(items.len()), self.count as usize);
            ptr::copy_nonoverlapping(items.as_ptr(), p, items.len());
        }
        self.count += n;
        Ok(())
    }

    /// Drops the last `n` elements.
    #[track_caller]
    pub fn pop_back_n(&mut self, n: u32) -> Result<(), ContainerError> {
        self.check_min_count(n)?;
        self.count -= n;
        Ok(())
    }

    /// Drops the first `n` elements, shifting the rest down.
    #[track_caller]
    pub fn pop_front_n(&mut self, n: u32) -> Result<(), ContainerError> {
        self.check_min_count(n)?;
        let p = self.block.as_ptr();
        let rest = (self.count - n) as usize;
        // SAFETY: [n, count) is initialized and lands in [0, count - n).
        unsafe { ptr::copy(p.add(n as usize), p, rest) };
        self.count -= n;
        Ok(())
    }

    #[track_caller]
    pub fn first(&self) -> Result<&T, ContainerError> {
        self.check_min_count(1)?;
        Ok(&self.as_slice()[0])
    }

    #[track_caller]
    pub fn last(&self) -> Result<&T, ContainerError> {
        self.check_min_count(1)?;
        Ok(&self.as_slice()[self.count as usize - 1])
    }

    /// Releases the storage and resets to an empty array.
    #[track_caller]
    pub fn free(&mut self, ctx: &mut C) {
        self.block.release(&self.config, ctx);
        self.count = 0;
    }

    fn len_u32(items: &[T]) -> Result<u32, ContainerError> {
        u32::try_from(items.len()).map_err(|_| ContainerError::CapacityOverflow)
    }

    #[track_caller]
    fn maybe_grow(&mut self, inc: u32, ctx: &mut C) -> Result<(), ContainerError> {
        let needed = self
            .count
            .checked_add(inc)
            .ok_or(ContainerError::CapacityOverflow)?;
        if needed > self.capacity() {
            self.grow(inc, ctx)?;
        }
        Ok(())
    }

    #[track_caller]
    fn grow(&mut self, inc: u32, ctx: &mut C) -> Result<(), ContainerError> {
        let old_capacity = self.capacity();
        let new_capacity = grown_capacity(self.count, old_capacity, inc)?;
        let mut block = RawBlock::allocate(new_capacity, &self.config, ctx)?;
        // SAFETY: both blocks hold at least `count` elements and are distinct.
        unsafe {
            ptr::copy_nonoverlapping(self.block.as_ptr(), block.as_ptr(), self.count as usize);
        }
        core::mem::swap(&mut self.block, &mut block);
        block.release(&self.config, ctx);
        tracing::trace!(
            from = old_capacity,
            to = new_capacity,
            count = self.count,
            "array grown"
        );
        Ok(())
    }

    #[track_caller]
    fn check_min_count(&self, required: u32) -> Result<(), ContainerError> {
        if self.count >= required {
            return Ok(());
        }
        let err = ContainerError::Underflow {
            required,
            count: self.count,
        };
        self.config
            .report("count >= required", &err.to_string(), Location::caller());
        Err(err)
    }
}

impl<T: Copy, C: Default> Drop for Array<T, C> {
    fn drop(&mut self) {
        if self.block.capacity() > 0 {
            tracing::debug!(
                capacity = self.block.capacity(),
                "array dropped while allocated; releasing with a default context"
            );
            let config = self.config;
            self.block.release(&config, &mut C::default());
        }
    }
}

impl<T: Copy, C: Default> Deref for Array<T, C> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy, C: Default> DerefMut for Array<T, C> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy + fmt::Debug, C: Default> fmt::Debug for Array<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
