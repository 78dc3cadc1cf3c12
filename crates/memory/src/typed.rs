//! Typed allocator adapter
//!
//! [`TypedAllocator<T>`] turns element counts into byte requests against a
//! [`MemoryContext`]. It is the contract containers consume through
//! [`ElementAllocator`].

use core::fmt;
use core::marker::PhantomData;
use core::mem::{align_of, size_of};
use core::ptr::{self, NonNull};

use strata_core::multi_type_cell;

use crate::binding::{self, MemoryContext};
use crate::error::{AllocResult, AllocateError, DeallocResult, DeallocateError};
use crate::system::DEFAULT_ALIGN;

/// Element-count allocation contract used by containers
pub trait ElementAllocator<T> {
    /// Reserves storage for `count` elements
    fn allocate(&self, count: usize) -> AllocResult<NonNull<T>>;

    /// Releases storage for `count` elements
    ///
    /// # Safety
    /// `ptr` must come from [`allocate`](Self::allocate) on the same
    /// allocator with the same `count`, and must not be used afterwards.
    unsafe fn deallocate(&self, count: usize, ptr: NonNull<T>) -> DeallocResult<()>;
}

multi_type_cell! {
    /// Failure while moving elements to a larger block
    ///
    /// Holds either the reservation error or the release error.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum GrowError {
        Allocate(AllocateError),
        Deallocate(DeallocateError),
    }
}

impl fmt::Display for GrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("grow failed"),
            Self::Allocate(e) => write!(f, "grow failed to reserve: {e}"),
            Self::Deallocate(e) => write!(f, "grow failed to release: {e}"),
        }
    }
}

impl std::error::Error for GrowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Allocate(e) => Some(e),
            Self::Deallocate(e) => Some(e),
        }
    }
}

/// Allocator for arrays of `T` over a memory context
pub struct TypedAllocator<T> {
    context: MemoryContext,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedAllocator<T> {
    /// Allocator over the process-wide binding
    pub fn new() -> Self {
        Self::in_context(binding::context().clone())
    }

    /// Allocator over an explicit context
    pub fn in_context(context: MemoryContext) -> Self {
        Self {
            context,
            _marker: PhantomData,
        }
    }

    /// Context requests are sent to
    pub fn context(&self) -> &MemoryContext {
        &self.context
    }

    fn byte_size(count: usize) -> AllocResult<usize> {
        let element_size = size_of::<T>();
        if count == 0 || element_size == 0 {
            return Err(AllocateError::ZeroSize);
        }
        if align_of::<T>() > DEFAULT_ALIGN {
            return Err(AllocateError::UnsupportedAlignment {
                align: align_of::<T>(),
                max: DEFAULT_ALIGN,
            });
        }
        count
            .checked_mul(element_size)
            .ok_or_else(|| AllocateError::size_overflow(count, element_size))
    }

    /// Reserves uninitialized storage for `count` elements
    ///
    /// # Errors
    /// - `ZeroSize` for a zero count or a zero-sized `T`
    /// - `UnsupportedAlignment` if `T` needs more than [`DEFAULT_ALIGN`]
    /// - `SizeOverflow` if `count * size_of::<T>()` overflows
    /// - `BadAllocate` if the context cannot serve the request
    pub fn allocate(&self, count: usize) -> AllocResult<NonNull<T>> {
        let size = Self::byte_size(count)?;
        Ok(self.context.allocate(size)?.cast())
    }

    /// Releases storage for `count` elements
    ///
    /// Elements are not dropped.
    ///
    /// # Safety
    /// `ptr` must come from [`allocate`](Self::allocate) on an allocator
    /// sharing this context with the same `count`.
    pub unsafe fn deallocate(&self, count: usize, ptr: NonNull<T>) -> DeallocResult<()> {
        let size = count
            .checked_mul(size_of::<T>())
            .ok_or(DeallocateError::SizeOverflow {
                count,
                element_size: size_of::<T>(),
            })?;
        // SAFETY: Caller guarantees ptr was reserved with count elements,
        // which is exactly `size` bytes.
        unsafe { self.context.deallocate(size, ptr.cast()) }
    }

    /// Moves `old_count` elements into a block of `new_count` elements
    ///
    /// At most `new_count` elements are moved. On failure the old block is
    /// untouched and still owns its elements.
    ///
    /// # Safety
    /// - `ptr` must come from [`allocate`](Self::allocate) with `old_count`
    /// - the first `min(old_count, new_count)` elements must be initialized
    /// - on success `ptr` is released and must not be used again
    pub unsafe fn grow(
        &self,
        ptr: NonNull<T>,
        old_count: usize,
        new_count: usize,
    ) -> Result<NonNull<T>, GrowError> {
        let grown = self.allocate(new_count)?;

        // SAFETY: Both blocks hold at least `min(old_count, new_count)`
        // elements and come from distinct reservations.
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), grown.as_ptr(), old_count.min(new_count));
        }

        // SAFETY: ptr/old_count are the caller's original reservation.
        if let Err(err) = unsafe { self.deallocate(old_count, ptr) } {
            // SAFETY: grown was reserved above with new_count and holds only
            // bitwise copies; the old block keeps ownership of the elements.
            let _ = unsafe { self.deallocate(new_count, grown) };
            return Err(err.into());
        }

        Ok(grown)
    }
}

impl<T> ElementAllocator<T> for TypedAllocator<T> {
    fn allocate(&self, count: usize) -> AllocResult<NonNull<T>> {
        Self::allocate(self, count)
    }

    unsafe fn deallocate(&self, count: usize, ptr: NonNull<T>) -> DeallocResult<()> {
        // SAFETY: Forwarded from the caller.
        unsafe { Self::deallocate(self, count, ptr) }
    }
}

impl<T> Default for TypedAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypedAllocator<T> {
    fn clone(&self) -> Self {
        Self::in_context(self.context.clone())
    }
}

impl<T> fmt::Debug for TypedAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAllocator")
            .field("type", &core::any::type_name::<T>())
            .field("context", &self.context)
            .finish()
    }
}
