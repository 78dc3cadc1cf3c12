//! Typed allocation as consumed by containers

use std::ptr::NonNull;

use pretty_assertions::assert_eq;
use strata_memory::{
    AllocResult, AllocateError, DeallocResult, DeallocateError, ElementAllocator, GrowError,
    MemoryContext, MemorySystem, SystemMemory, TypedAllocator,
};

/// Minimal growable buffer written against the container-facing contract
struct Buffer<T, A: ElementAllocator<T>> {
    alloc: A,
    ptr: Option<NonNull<T>>,
    len: usize,
    cap: usize,
}

impl<T: Copy, A: ElementAllocator<T>> Buffer<T, A> {
    fn new(alloc: A) -> Self {
        Self {
            alloc,
            ptr: None,
            len: 0,
            cap: 0,
        }
    }

    fn push(&mut self, value: T) -> AllocResult<()> {
        if self.len == self.cap {
            let new_cap = (self.cap * 2).max(4);
            let grown = self.alloc.allocate(new_cap)?;
            if let Some(old) = self.ptr {
                // SAFETY: old holds len initialized elements, grown holds new_cap slots.
                unsafe {
                    std::ptr::copy_nonoverlapping(old.as_ptr(), grown.as_ptr(), self.len);
                    self.alloc
                        .deallocate(self.cap, old)
                        .expect("release of old storage");
                }
            }
            self.ptr = Some(grown);
            self.cap = new_cap;
        }

        let ptr = self.ptr.expect("storage reserved above");
        // SAFETY: len < cap, so the slot lies inside the reservation.
        unsafe { ptr.add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    fn as_slice(&self) -> &[T] {
        match self.ptr {
            // SAFETY: the first len elements are initialized.
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len) },
            None => &[],
        }
    }
}

impl<T, A: ElementAllocator<T>> Drop for Buffer<T, A> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr {
            // SAFETY: ptr was reserved with cap elements by this allocator.
            unsafe { self.alloc.deallocate(self.cap, ptr).expect("release") };
        }
    }
}

#[test]
fn test_container_grows_through_typed_allocator() {
    let alloc = TypedAllocator::<u32>::in_context(MemoryContext::system());
    let mut buffer = Buffer::new(alloc);

    for value in 0..20 {
        buffer.push(value).expect("push");
    }

    assert_eq!(buffer.as_slice().len(), 20);
    assert_eq!(buffer.as_slice()[19], 19);
    assert_eq!(buffer.cap, 32);
}

#[test]
fn test_grow_keeps_prefix() {
    let alloc = TypedAllocator::<u64>::in_context(MemoryContext::system());
    let ptr = alloc.allocate(3).expect("allocate");

    // SAFETY: ptr holds 3 slots; grown holds 6.
    unsafe {
        for i in 0..3 {
            ptr.add(i).write(100 + i as u64);
        }
        let grown = alloc.grow(ptr, 3, 6).expect("grow");
        let prefix = std::slice::from_raw_parts(grown.as_ptr(), 3);
        assert_eq!(prefix, &[100, 101, 102]);
        alloc.deallocate(6, grown).expect("release");
    }
}

fn system_allocate(size: usize) -> AllocResult<NonNull<u8>> {
    SystemMemory.allocate(size)
}

unsafe fn refusing_deallocate(size: usize, _ptr: NonNull<u8>) -> DeallocResult<()> {
    Err(DeallocateError::BadDeallocate { size })
}

#[test]
fn test_grow_reports_release_failure() {
    let context = MemoryContext::from_fns(system_allocate, refusing_deallocate);
    let alloc = TypedAllocator::<u8>::in_context(context);
    let ptr = alloc.allocate(4).expect("allocate");

    // SAFETY: ptr holds 4 bytes; grow leaves it untouched on failure.
    let mut error = unsafe {
        ptr.write_bytes(7, 4);
        alloc.grow(ptr, 4, 16)
    }
    .unwrap_err();

    assert_eq!(error.active_index(), Some(1));
    assert!(error.to_string().contains("release"));
    assert!(error.at::<0>().is_err());
    assert_eq!(
        error.at::<1>(),
        Ok(DeallocateError::BadDeallocate { size: 4 })
    );

    // The old block still owns its bytes
    // SAFETY: ptr was not released by the failed grow.
    unsafe {
        assert_eq!(ptr.read(), 7);
        SystemMemory.deallocate(4, ptr).expect("direct release");
    }
}

#[test]
fn test_allocation_errors_surface_unchanged() {
    let alloc = TypedAllocator::<u32>::in_context(MemoryContext::system());
    assert_eq!(alloc.allocate(0), Err(AllocateError::ZeroSize));
    assert!(matches!(
        alloc.allocate(usize::MAX),
        Err(AllocateError::SizeOverflow { element_size: 4, .. })
    ));

    let error: GrowError = AllocateError::ZeroSize.into();
    assert_eq!(error, GrowError::Allocate(AllocateError::ZeroSize));
}
