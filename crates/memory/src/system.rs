//! System allocator implementation
//!
//! Default [`MemorySystem`] backed by the platform allocator through
//! [`std::alloc::System`]. Every reservation is aligned to [`DEFAULT_ALIGN`],
//! the fundamental alignment a C `malloc` guarantees.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::alloc::System;

use crate::error::{AllocResult, AllocateError, DeallocResult, DeallocateError};
use crate::traits::MemorySystem;

/// Alignment of every block handed out by a [`MemorySystem`]
pub const DEFAULT_ALIGN: usize = 16;

/// System allocator using the platform's default allocator
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemory;

impl SystemMemory {
    /// Creates a new system strategy
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[inline]
    fn layout(size: usize) -> Option<Layout> {
        Layout::from_size_align(size, DEFAULT_ALIGN).ok()
    }
}

impl MemorySystem for SystemMemory {
    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        if size == 0 {
            return Err(AllocateError::ZeroSize);
        }

        let layout =
            Self::layout(size).ok_or_else(|| AllocateError::bad_allocate(size, DEFAULT_ALIGN))?;

        // SAFETY: layout has non-zero size (checked above) and a valid
        // power-of-two alignment (DEFAULT_ALIGN).
        let ptr = unsafe { System.alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| AllocateError::bad_allocate(size, DEFAULT_ALIGN))
    }

    unsafe fn deallocate(&self, size: usize, ptr: NonNull<u8>) -> DeallocResult<()> {
        if size == 0 {
            return Err(DeallocateError::ZeroSize);
        }

        let layout = Self::layout(size).ok_or(DeallocateError::BadDeallocate { size })?;

        // SAFETY: Caller guarantees ptr came from `allocate` with this size,
        // so it was reserved from System with exactly this layout.
        unsafe { System.dealloc(ptr.as_ptr(), layout) };
        Ok(())
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::is_aligned_ptr;

    #[test]
    fn test_system_allocate_deallocate() {
        let system = SystemMemory::new();
        let ptr = system.allocate(64).unwrap();
        assert!(is_aligned_ptr(ptr.as_ptr(), DEFAULT_ALIGN));

        // SAFETY: ptr is a fresh 64-byte reservation from this strategy.
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 64);
            assert_eq!(*ptr.as_ptr().add(63), 0xAB);
            system.deallocate(64, ptr).unwrap();
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        let system = SystemMemory::new();
        assert_eq!(system.allocate(0), Err(AllocateError::ZeroSize));

        let dangling = NonNull::<u8>::dangling();
        // SAFETY: zero size is rejected before the pointer is touched.
        let result = unsafe { system.deallocate(0, dangling) };
        assert_eq!(result, Err(DeallocateError::ZeroSize));
    }

    #[test]
    fn test_impossible_size_fails_cleanly() {
        let system = SystemMemory::new();
        let result = system.allocate(usize::MAX - 4);
        assert!(matches!(result, Err(AllocateError::BadAllocate { .. })));
    }
}
