//! Allocation and assertion policy shared by every container.
//!
//! A [`Config`] is a small `Copy` record of callbacks handed to a container
//! when it is built. Containers call into it only to allocate, to release,
//! or to report a broken precondition. The per-call context `C` is owned by
//! the caller and forwarded verbatim to `alloc` and `release`; containers
//! never look at it. Use `C = ()` when no instrumentation is needed.

use core::alloc::Layout;
use core::fmt;
use core::panic::Location;
use core::ptr::NonNull;

/// Allocates a block for `layout`. `layout.size()` is never zero.
/// Returning `None` makes the calling operation fail with
/// [`ContainerError::OutOfMemory`](crate::ContainerError::OutOfMemory).
pub type AllocFn<C> = fn(Layout, &mut C, &'static Location<'static>) -> Option<NonNull<u8>>;

/// Returns a block previously handed out by the matching [`AllocFn`] with
/// the same layout.
pub type ReleaseFn<C> = fn(NonNull<u8>, Layout, &mut C, &'static Location<'static>);

/// Receives every precondition violation before the operation fails.
/// May panic; must not touch the container that reported.
pub type AssertFailedFn = fn(&AssertionFailure<'_>);

/// What a container does after the assertion hook returns.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CheckPolicy {
    /// Return the error to the caller.
    #[default]
    Report,
    /// Panic with the failure message. State is untouched either way.
    Panic,
}

/// A broken precondition, as seen by the assertion hook.
#[derive(Clone, Debug)]
pub struct AssertionFailure<'a> {
    /// The condition that did not hold.
    pub expression: &'static str,
    /// Human-readable description, e.g. "array must contain at least 1 element".
    pub message: &'a str,
    /// Call site of the public container operation.
    pub location: &'static Location<'static>,
}

/// Allocation and assertion callbacks for containers using context `C`.
pub struct Config<C = ()> {
    /// Called for every new block, with the public call site.
    pub alloc: AllocFn<C>,
    /// Called when a block is replaced on growth, freed or dropped.
    pub release: ReleaseFn<C>,
    /// Sees each precondition violation before `checks` is applied.
    pub assert_failed: AssertFailedFn,
    pub checks: CheckPolicy,
}

impl<C> Config<C> {
    /// Default callbacks: global heap and a `tracing` report.
    pub fn new() -> Self {
        Self {
            alloc: default_alloc::<C>,
            release: default_release::<C>,
            assert_failed: default_assert_failed,
            checks: CheckPolicy::Report,
        }
    }

    /// Default callbacks, panicking on any precondition violation.
    pub fn strict() -> Self {
        Self {
            checks: CheckPolicy::Panic,
            ..Self::new()
        }
    }

    /// Runs the assertion hook, then applies the check policy.
    ///
    /// Returns normally only under [`CheckPolicy::Report`].
    pub(crate) fn report(
        &self,
        expression: &'static str,
        message: &str,
        location: &'static Location<'static>,
    ) {
        (self.assert_failed)(&AssertionFailure {
            expression,
            message,
            location,
        });
        if self.checks == CheckPolicy::Panic {
            panic!("{message}");
        }
    }
}

impl<C> Default for Config<C> {
    fn default() -> Self {
        Self::new()
    }
}

// Function pointers are Copy for every C; derives would demand C: Copy.
impl<C> Clone for Config<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Config<C> {}

impl<C> fmt::Debug for Config<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("alloc", &(self.alloc as *const ()))
            .field("release", &(self.release as *const ()))
            .field("assert_failed", &(self.assert_failed as *const ()))
            .field("checks", &self.checks)
            .finish()
    }
}

/// Allocates from the global heap.
pub fn default_alloc<C>(
    layout: Layout,
    _ctx: &mut C,
    _site: &'static Location<'static>,
) -> Option<NonNull<u8>> {
    debug_assert!(layout.size() > 0);
    // SAFETY: containers never request zero-sized layouts.
    NonNull::new(unsafe { std::alloc::alloc(layout) })
}

/// Returns a block to the global heap.
pub fn default_release<C>(
    ptr: NonNull<u8>,
    layout: Layout,
    _ctx: &mut C,
    _site: &'static Location<'static>,
) {
    // SAFETY: `ptr` came from `default_alloc` with this exact layout.
    unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
}

/// Logs the failure at `error` level and returns.
pub fn default_assert_failed(failure: &AssertionFailure<'_>) {
    tracing::error!(
        expression = failure.expression,
        file = failure.location.file(),
        line = failure.location.line(),
        "assertion failed: {}",
        failure.message
    );
}
