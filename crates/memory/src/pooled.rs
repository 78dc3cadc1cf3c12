//! Size-class routing strategy
//!
//! [`PooledMemory`] serves small requests from dedicated
//! [`FixedSizePool`]s, one per configured size class, and everything else
//! from a fallback context. It implements [`MemorySystem`], so it can be
//! installed as the process-wide strategy:
//!
//! ```
//! use strata_memory::{MemoryContext, PooledConfig, PooledMemory};
//!
//! let pooled = PooledMemory::new(MemoryContext::system(), PooledConfig::standard())?;
//! let context = MemoryContext::new(pooled);
//!
//! let block = context.allocate(24)?;
//! // SAFETY: block was reserved from this context with 24 bytes.
//! unsafe { context.deallocate(24, block)? };
//! # Ok::<(), strata_memory::MemoryError>(())
//! ```

use core::fmt;
use core::ptr::NonNull;

use parking_lot::Mutex;
#[cfg(feature = "logging")]
use tracing::{debug, trace};

use crate::binding::MemoryContext;
use crate::config::PooledConfig;
use crate::error::{
    AllocResult, AllocateError, DeallocResult, DeallocateError, MemoryError, MemoryResult,
};
use crate::pool::FixedSizePool;
use crate::system::DEFAULT_ALIGN;
use crate::traits::MemorySystem;
use crate::utils::checked_align_up;

struct ClassPool {
    /// Largest request served by this class
    limit: usize,
    /// Cached ownership range of the pool buffer
    range: (usize, usize),
    pool: Mutex<FixedSizePool>,
}

impl ClassPool {
    fn owns(&self, address: usize) -> bool {
        (self.range.0..self.range.1).contains(&address)
    }
}

/// Strategy routing requests to size-class pools with a fallback
pub struct PooledMemory {
    classes: Vec<ClassPool>,
    fallback: MemoryContext,
}

impl PooledMemory {
    /// Creates one pool per size class, each backed by `fallback`
    ///
    /// Class block sizes are rounded up to [`DEFAULT_ALIGN`] so pooled
    /// blocks keep the alignment every strategy guarantees.
    pub fn new(fallback: MemoryContext, config: PooledConfig) -> MemoryResult<Self> {
        config.validate()?;

        let mut classes = Vec::with_capacity(config.classes.len());
        for class in &config.classes {
            let block_size = checked_align_up(class.block_size, DEFAULT_ALIGN)
                .ok_or_else(|| MemoryError::invalid_config("size class too large"))?;
            let pool_config = config.pool_config(*class).with_block_size(block_size);
            let pool = FixedSizePool::with_config(&fallback, pool_config)?;

            classes.push(ClassPool {
                limit: class.block_size,
                range: pool.range(),
                pool: Mutex::new(pool),
            });
        }

        #[cfg(feature = "logging")]
        debug!(
            classes = classes.len(),
            fallback = fallback.name(),
            "pooled memory created"
        );

        Ok(Self { classes, fallback })
    }

    /// Creates the standard size classes over the platform allocator
    pub fn standard() -> MemoryResult<Self> {
        Self::new(MemoryContext::system(), PooledConfig::standard())
    }

    /// Context receiving requests no class can serve
    pub fn fallback(&self) -> &MemoryContext {
        &self.fallback
    }

    /// `(class limit, free blocks)` for every size class
    pub fn free_blocks_per_class(&self) -> Vec<(usize, usize)> {
        self.classes
            .iter()
            .map(|class| (class.limit, class.pool.lock().free_blocks()))
            .collect()
    }

    fn class_for(&self, size: usize) -> Option<&ClassPool> {
        self.classes.iter().find(|class| size <= class.limit)
    }
}

impl MemorySystem for PooledMemory {
    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        if size == 0 {
            return Err(AllocateError::ZeroSize);
        }

        if let Some(class) = self.class_for(size) {
            let served = class.pool.lock().allocate();
            if let Ok(block) = served {
                return Ok(block);
            }

            #[cfg(feature = "logging")]
            trace!(size, class = class.limit, "size class exhausted, using fallback");
        }

        self.fallback.allocate(size)
    }

    unsafe fn deallocate(&self, size: usize, ptr: NonNull<u8>) -> DeallocResult<()> {
        if size == 0 {
            return Err(DeallocateError::ZeroSize);
        }

        let address = ptr.addr().get();
        if let Some(class) = self.classes.iter().find(|class| class.owns(address)) {
            return class
                .pool
                .lock()
                .deallocate(ptr)
                .map_err(|_| DeallocateError::BadDeallocate { size });
        }

        // SAFETY: The address is outside every class pool, so it was served
        // by the fallback with this size (caller's contract).
        unsafe { self.fallback.deallocate(size, ptr) }
    }

    fn name(&self) -> &'static str {
        "pooled"
    }
}

impl fmt::Debug for PooledMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledMemory")
            .field("classes", &self.free_blocks_per_class())
            .field("fallback", &self.fallback)
            .finish()
    }
}

// Class pools are shared across threads only through their mutexes
static_assertions::assert_impl_all!(PooledMemory: Send, Sync, MemorySystem);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::is_aligned_ptr;

    fn small() -> PooledMemory {
        let config = PooledConfig::builder().with_class(16, 2).with_class(64, 1);
        PooledMemory::new(MemoryContext::system(), config).unwrap()
    }

    #[test]
    fn test_routes_to_smallest_fitting_class() {
        let pooled = small();
        let block = pooled.allocate(10).unwrap();
        assert!(is_aligned_ptr(block.as_ptr(), DEFAULT_ALIGN));
        assert_eq!(pooled.free_blocks_per_class(), vec![(16, 1), (64, 1)]);

        // SAFETY: block was reserved above with size 10.
        unsafe { pooled.deallocate(10, block).unwrap() };
        assert_eq!(pooled.free_blocks_per_class(), vec![(16, 2), (64, 1)]);
    }

    #[test]
    fn test_oversized_request_uses_fallback() {
        let pooled = small();
        let block = pooled.allocate(1024).unwrap();
        assert_eq!(pooled.free_blocks_per_class(), vec![(16, 2), (64, 1)]);

        // SAFETY: block was reserved above with size 1024.
        unsafe { pooled.deallocate(1024, block).unwrap() };
    }

    #[test]
    fn test_invalid_config_rejected() {
        let error = PooledMemory::new(MemoryContext::system(), PooledConfig::builder()).unwrap_err();
        assert_eq!(error.code(), "MEM:CONFIG:INVALID");
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(small().allocate(0), Err(AllocateError::ZeroSize));
    }
}
