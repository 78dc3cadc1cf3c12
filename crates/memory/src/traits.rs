//! Allocation strategy trait
//!
//! A [`MemorySystem`] is the pluggable allocate/deallocate pair that sits
//! behind the process binding, behind every [`MemoryContext`] and behind the
//! typed allocators.
//!
//! # Safety
//!
//! Releasing memory is the only unsafe operation: the caller must hand back
//! a pointer obtained from the same strategy together with the exact size it
//! was reserved with. A size mismatch is not detected at this layer.
//!
//! [`MemoryContext`]: crate::MemoryContext

use core::ptr::NonNull;

use crate::error::{AllocResult, DeallocResult};

/// Host-supplied reservation function
///
/// Must return [`AllocateError::ZeroSize`](crate::AllocateError::ZeroSize)
/// for a zero size and
/// [`AllocateError::BadAllocate`](crate::AllocateError::BadAllocate) when the
/// reservation fails. Returned memory must be aligned to
/// [`DEFAULT_ALIGN`](crate::DEFAULT_ALIGN).
pub type AllocateFn = fn(usize) -> AllocResult<NonNull<u8>>;

/// Host-supplied release function, paired with an [`AllocateFn`]
///
/// # Safety
///
/// Called only with pointers returned by the paired [`AllocateFn`] and the
/// size they were reserved with.
pub type DeallocateFn = unsafe fn(usize, NonNull<u8>) -> DeallocResult<()>;

/// Pluggable allocation strategy
///
/// Implementations must be shareable across threads; the binding hands the
/// same strategy to every caller in the process.
pub trait MemorySystem: Send + Sync {
    /// Reserves `size` bytes aligned to [`DEFAULT_ALIGN`](crate::DEFAULT_ALIGN)
    ///
    /// # Errors
    /// - `ZeroSize` if `size == 0`
    /// - `BadAllocate` if the reservation fails
    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>>;

    /// Releases memory reserved by [`allocate`](Self::allocate)
    ///
    /// # Safety
    /// - `ptr` must have been returned by `allocate` on this strategy
    /// - `size` must equal the size passed to that `allocate` call
    /// - `ptr` must not be used or released again afterwards
    ///
    /// # Errors
    /// - `ZeroSize` if `size == 0`
    /// - `BadDeallocate` if the release fails
    unsafe fn deallocate(&self, size: usize, ptr: NonNull<u8>) -> DeallocResult<()>;

    /// Strategy name for diagnostics
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl<M: MemorySystem + ?Sized> MemorySystem for &'static M {
    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        (**self).allocate(size)
    }

    unsafe fn deallocate(&self, size: usize, ptr: NonNull<u8>) -> DeallocResult<()> {
        // SAFETY: Caller's contract is forwarded unchanged to the referenced strategy.
        unsafe { (**self).deallocate(size, ptr) }
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
