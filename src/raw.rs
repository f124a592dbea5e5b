//! Typed buffers allocated through a [`Config`].
//!
//! `RawBlock<T>` is the only place that turns an element count into a
//! `Layout` and calls the policy callbacks. It has no `Drop`: the owning
//! container decides when and with which context the block is released.

use crate::error::ContainerError;
use crate::policy::Config;
use core::alloc::Layout;
use core::panic::Location;
use core::ptr::NonNull;

pub(crate) struct RawBlock<T> {
    ptr: NonNull<T>,
    capacity: u32,
}

impl<T> RawBlock<T> {
    /// A block with no storage. Never handed to `release`.
    pub(crate) const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
        }
    }

    fn layout(capacity: u32) -> Result<Layout, ContainerError> {
        Layout::array::<T>(capacity as usize).map_err(|_| ContainerError::CapacityOverflow)
    }

    /// Allocates room for `capacity` elements. Contents are uninitialized.
    #[track_caller]
    pub(crate) fn allocate<C>(
        capacity: u32,
        config: &Config<C>,
        ctx: &mut C,
    ) -> Result<Self, ContainerError> {
        let layout = Self::layout(capacity)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
            });
        }
        let raw = (config.alloc)(layout, ctx, Location::caller()).ok_or(
            ContainerError::OutOfMemory {
                bytes: layout.size(),
            },
        )?;
        Ok(Self {
            ptr: raw.cast(),
            capacity,
        })
    }

    /// Allocates `capacity` elements and zero-fills them.
    #[track_caller]
    pub(crate) fn allocate_zeroed<C>(
        capacity: u32,
        config: &Config<C>,
        ctx: &mut C,
    ) -> Result<Self, ContainerError> {
        let block = Self::allocate(capacity, config, ctx)?;
        // SAFETY: the block spans `capacity` elements.
        unsafe { block.ptr.as_ptr().write_bytes(0, capacity as usize) };
        Ok(block)
    }

    /// Hands the storage back to the policy and leaves `self` empty.
    #[track_caller]
    pub(crate) fn release<C>(&mut self, config: &Config<C>, ctx: &mut C) {
        let block = core::mem::replace(self, Self::empty());
        if block.capacity == 0 {
            return;
        }
        // Capacity was validated by `allocate`.
        let Ok(layout) = Self::layout(block.capacity) else {
            return;
        };
        if layout.size() == 0 {
            return;
        }
        (config.release)(block.ptr.cast(), layout, ctx, Location::caller());
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Views the first `len` elements.
    ///
    /// # Safety
    /// `len <= capacity` and those elements are initialized.
    #[inline]
    pub(crate) unsafe fn slice(&self, len: u32) -> &[T] {
        core::slice::from_raw_parts(self.ptr.as_ptr(), len as usize)
    }

    /// Mutable view of the first `len` elements.
    ///
    /// # Safety
    /// `len <= capacity` and those elements are initialized.
    #[inline]
    pub(crate) unsafe fn slice_mut(&mut self, len: u32) -> &mut [T] {
        core::slice::from_raw_parts_mut(self.ptr.as_ptr(), len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::RawBlock;
    use crate::policy::Config;
    use core::alloc::Layout;
    use core::panic::Location;
    use core::ptr::NonNull;

    fn counting_alloc(
        layout: Layout,
        live: &mut i32,
        site: &'static Location<'static>,
    ) -> Option<NonNull<u8>> {
        *live += 1;
        crate::policy::default_alloc(layout, &mut (), site)
    }

    fn counting_release(
        ptr: NonNull<u8>,
        layout: Layout,
        live: &mut i32,
        site: &'static Location<'static>,
    ) {
        *live -= 1;
        crate::policy::default_release(ptr, layout, &mut (), site)
    }

    fn failing_alloc(
        _layout: Layout,
        _ctx: &mut (),
        _site: &'static Location<'static>,
    ) -> Option<NonNull<u8>> {
        None
    }

    fn counting() -> Config<i32> {
        Config {
            alloc: counting_alloc,
            release: counting_release,
            ..Config::new()
        }
    }

    #[test]
    fn zeroed_block_reads_as_zero() {
        let config = Config::<()>::new();
        let mut block = RawBlock::<u32>::allocate_zeroed(8, &config, &mut ()).unwrap();
        assert_eq!(block.capacity(), 8);
        assert_eq!(unsafe { block.slice(8) }, &[0u32; 8]);
        block.release(&config, &mut ());
        assert_eq!(block.capacity(), 0);
    }

    #[test]
    fn release_is_noop_on_empty_block() {
        let config = counting();
        let mut live = 0;
        let mut block = RawBlock::<u64>::empty();
        block.release(&config, &mut live);
        assert_eq!(live, 0);
    }

    #[test]
    fn zero_sized_elements_skip_the_allocator() {
        let config = counting();
        let mut live = 0;
        let mut block = RawBlock::<()>::allocate(32, &config, &mut live).unwrap();
        assert_eq!(live, 0);
        assert_eq!(block.capacity(), 32);
        block.release(&config, &mut live);
        assert_eq!(live, 0);
    }

    #[test]
    fn context_tracks_allocate_and_release() {
        let config = counting();
        let mut live = 0;
        let mut a = RawBlock::<u8>::allocate(3, &config, &mut live).unwrap();
        let mut b = RawBlock::<u8>::allocate(5, &config, &mut live).unwrap();
        assert_eq!(live, 2);
        a.release(&config, &mut live);
        b.release(&config, &mut live);
        assert_eq!(live, 0);
    }

    #[test]
    fn failed_allocation_surfaces_out_of_memory() {
        let config = Config::<()> {
            alloc: failing_alloc,
            ..Config::new()
        };
        match RawBlock::<u32>::allocate(4, &config, &mut ()) {
            Err(crate::ContainerError::OutOfMemory { bytes }) => assert_eq!(bytes, 16),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("allocation should fail"),
        }
    }
}
