//! Fixed-size block pool
//!
//! One contiguous buffer is reserved up front and carved into equally sized
//! blocks. Free blocks form an intrusive singly linked list: the first bytes
//! of every free block hold the address of the next free block, so the pool
//! needs no bookkeeping memory besides its own header.
//!
//! ```text
//! base                                                       base + size
//!  | block 0 | block 1 | block 2 | block 3 |
//!      |         ^ |       ^ |       ^
//!      +---------+ +-------+ +-------+        head -> 0 -> 1 -> 2 -> 3 -> end
//! ```
//!
//! Allocation pops the head, deallocation pushes onto it; both are O(1).
//! The pool is not synchronized. Share it behind a lock.

use core::fmt;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::{debug, error};

use crate::binding::{self, MemoryContext};
use crate::config::PoolConfig;
use crate::error::{AllocResult, AllocateError, DeallocResult, PoolError, PoolResult};
use crate::system::DEFAULT_ALIGN;
use crate::utils::block_stride;

/// Free-list link stored in the first bytes of every free block
#[repr(C)]
struct FreeBlock {
    next: Option<NonNull<FreeBlock>>,
}

/// Fixed-size block pool over an intrusive free list
pub struct FixedSizePool {
    base: NonNull<u8>,
    block_size: usize,
    capacity: usize,
    total_size: usize,
    free_count: usize,
    free_head: Option<NonNull<FreeBlock>>,
    context: MemoryContext,
    config: PoolConfig,
    released: bool,
}

impl FixedSizePool {
    /// Creates a pool through the process-wide binding
    ///
    /// # Errors
    /// - `ZeroSize` if `block_size` or `capacity` is zero
    /// - `SizeOverflow` if the buffer size overflows
    /// - `BadAllocate` if the buffer cannot be reserved
    pub fn new(block_size: usize, capacity: usize) -> AllocResult<Self> {
        Self::new_in(binding::context(), block_size, capacity)
    }

    /// Creates a pool whose buffer comes from `context`
    pub fn new_in(context: &MemoryContext, block_size: usize, capacity: usize) -> AllocResult<Self> {
        Self::with_config(context, PoolConfig::new(block_size, capacity))
    }

    /// Creates a pool with custom configuration
    pub fn with_config(context: &MemoryContext, config: PoolConfig) -> AllocResult<Self> {
        Self::build(context, config, align_of::<FreeBlock>())
    }

    /// Creates a pool whose blocks each hold one `T`
    ///
    /// # Errors
    /// `UnsupportedAlignment` if `T` needs more than [`DEFAULT_ALIGN`].
    pub fn for_type<T>(capacity: usize) -> AllocResult<Self> {
        if align_of::<T>() > DEFAULT_ALIGN {
            return Err(AllocateError::UnsupportedAlignment {
                align: align_of::<T>(),
                max: DEFAULT_ALIGN,
            });
        }
        let config = PoolConfig::new(size_of::<T>().max(1), capacity);
        Self::build(binding::context(), config, align_of::<T>().max(align_of::<FreeBlock>()))
    }

    fn build(context: &MemoryContext, config: PoolConfig, align: usize) -> AllocResult<Self> {
        if config.block_size == 0 || config.capacity == 0 {
            return Err(AllocateError::ZeroSize);
        }

        let block_size = block_stride(config.block_size, size_of::<FreeBlock>(), align)
            .ok_or_else(|| AllocateError::size_overflow(1, config.block_size))?;
        let total_size = block_size
            .checked_mul(config.capacity)
            .ok_or_else(|| AllocateError::size_overflow(config.capacity, block_size))?;

        let base = context.allocate(total_size)?;

        let mut pool = Self {
            base,
            block_size,
            capacity: config.capacity,
            total_size,
            free_count: 0,
            free_head: None,
            context: context.clone(),
            config,
            released: false,
        };
        pool.thread_free_list();

        #[cfg(feature = "logging")]
        debug!(
            block_size,
            capacity = pool.capacity,
            system = pool.context.name(),
            "fixed-size pool created"
        );

        Ok(pool)
    }

    /// Links every block into the free list, lowest address first
    fn thread_free_list(&mut self) {
        let mut head = None;

        for index in (0..self.capacity).rev() {
            // SAFETY: index < capacity, so the offset stays inside the
            // total_size bytes reserved at base.
            let block = unsafe { self.base.add(index * self.block_size) }.cast::<FreeBlock>();

            // SAFETY: Writing the link of a free block.
            // - block lies inside the buffer and spans at least size_of::<FreeBlock>() bytes
            // - base is DEFAULT_ALIGN aligned and block_size is a multiple of the link alignment
            // - the block is not handed out (construction, or reset contract)
            unsafe { block.write(FreeBlock { next: head }) };
            head = Some(block);
        }

        self.free_head = head;
        self.free_count = self.capacity;
    }

    /// Hands out one block
    ///
    /// # Errors
    /// `EmptyPool` when every block is in use; the pool is left unchanged.
    pub fn allocate(&mut self) -> PoolResult<NonNull<u8>> {
        let Some(block) = self.free_head else {
            return Err(PoolError::empty_pool(self.capacity));
        };

        // SAFETY: block is the free-list head, a free block inside the buffer
        // whose link was written by thread_free_list or deallocate.
        self.free_head = unsafe { block.read().next };
        self.free_count -= 1;

        let ptr = block.cast::<u8>();
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: The block spans block_size bytes inside the buffer and
            // was just removed from the free list.
            unsafe { ptr.write_bytes(pattern, self.block_size) };
        }

        Ok(ptr)
    }

    /// Returns a block to the pool
    ///
    /// The address must be one handed out by [`allocate`](Self::allocate)
    /// and not returned since. A repeated return is only caught while no
    /// block is outstanding.
    ///
    /// # Errors
    /// - `Ownership` if `ptr` lies outside the buffer
    /// - `Misaligned` if `ptr` is inside the buffer but not on a block boundary
    /// - `PoolFull` if every block is already free
    ///
    /// Neither error changes the pool.
    pub fn deallocate(&mut self, ptr: NonNull<u8>) -> PoolResult<()> {
        let (range_min, range_max) = self.range();
        let address = ptr.addr().get();

        if !(range_min..range_max).contains(&address) {
            return Err(PoolError::ownership(address, range_min, range_max));
        }

        let offset = address - range_min;
        if offset % self.block_size != 0 {
            return Err(PoolError::Misaligned {
                address,
                block_size: self.block_size,
            });
        }

        if self.is_full() {
            return Err(PoolError::pool_full(self.capacity));
        }

        // SAFETY: offset is a block boundary inside the buffer (checked above).
        let block = unsafe { self.base.add(offset) };

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: The block spans block_size bytes inside the buffer and
            // the caller hands it back, so nothing else uses it.
            unsafe { block.write_bytes(pattern, self.block_size) };
        }

        let block = block.cast::<FreeBlock>();
        // SAFETY: Same block as above, aligned for FreeBlock since block_size
        // is a multiple of the link alignment.
        unsafe {
            block.write(FreeBlock {
                next: self.free_head,
            });
        }
        self.free_head = Some(block);
        self.free_count += 1;

        Ok(())
    }

    /// Returns true if no block is free
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.free_count == 0
    }

    /// Returns true if every block is free
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_count == self.capacity
    }

    /// Number of free blocks
    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.free_count
    }

    /// Number of blocks handed out
    #[inline]
    pub fn allocated_blocks(&self) -> usize {
        self.capacity - self.free_count
    }

    /// Total number of blocks
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Effective block size in bytes
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Ownership range `[range_min, range_max)` as addresses
    #[inline]
    pub fn range(&self) -> (usize, usize) {
        let range_min = self.base.addr().get();
        (range_min, range_min + self.total_size)
    }

    /// Checks if the address lies inside this pool's buffer
    #[inline]
    pub fn owns(&self, ptr: *const u8) -> bool {
        let (range_min, range_max) = self.range();
        (range_min..range_max).contains(&ptr.addr())
    }

    /// Context the buffer was reserved from
    pub fn context(&self) -> &MemoryContext {
        &self.context
    }

    /// Returns every block to the free list
    ///
    /// # Safety
    /// No block handed out before the reset may be used afterwards.
    pub unsafe fn reset(&mut self) {
        self.thread_free_list();

        #[cfg(feature = "logging")]
        debug!(capacity = self.capacity, "fixed-size pool reset");
    }

    /// Releases the buffer through the context it came from
    ///
    /// Blocks still handed out become dangling.
    pub fn destroy(mut self) -> DeallocResult<()> {
        self.release()
    }

    fn release(&mut self) -> DeallocResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.free_head = None;
        self.free_count = 0;

        #[cfg(feature = "logging")]
        debug!(
            block_size = self.block_size,
            capacity = self.capacity,
            "fixed-size pool destroyed"
        );

        // SAFETY: base was reserved from this context with total_size bytes
        // and the released flag guarantees a single release.
        unsafe { self.context.deallocate(self.total_size, self.base) }
    }
}

impl Drop for FixedSizePool {
    fn drop(&mut self) {
        if let Err(_err) = self.release() {
            #[cfg(feature = "logging")]
            error!(error = %_err, size = self.total_size, "failed to release pool buffer");
        }
    }
}

// SAFETY: FixedSizePool is Send because:
// - base and the free-list links point into a buffer owned exclusively by the pool
// - MemoryContext is Send + Sync
// - all mutation goes through &mut self
// It is not Sync.
unsafe impl Send for FixedSizePool {}

static_assertions::assert_impl_all!(FixedSizePool: Send);
static_assertions::assert_not_impl_any!(FixedSizePool: Sync);

impl fmt::Debug for FixedSizePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (range_min, range_max) = self.range();
        f.debug_struct("FixedSizePool")
            .field("block_size", &self.block_size)
            .field("capacity", &self.capacity)
            .field("free_blocks", &self.free_count)
            .field("range", &format_args!("{range_min:#x}..{range_max:#x}"))
            .field("context", &self.context)
            .finish()
    }
}
