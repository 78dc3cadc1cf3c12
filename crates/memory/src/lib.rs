//! # strata-memory
//!
//! Allocation foundation for the strata engine.
//!
//! This crate provides:
//! - A process-wide, swappable allocation strategy ([`MemoryBinding`])
//! - Explicitly passed strategy handles ([`MemoryContext`])
//! - A fixed-size block pool over an intrusive free list ([`FixedSizePool`])
//! - A safe index-based pool for typed values ([`SlotPool`])
//! - A size-class routing strategy ([`PooledMemory`])
//! - An element-count allocator for containers ([`TypedAllocator`])
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_memory::prelude::*;
//!
//! fn main() -> MemoryResult<()> {
//!     strata_memory::init()?;
//!
//!     let mut pool = FixedSizePool::new(16, 4)?;
//!     let block = pool.allocate()?;
//!     pool.deallocate(block)?;
//!     assert!(pool.is_full());
//!
//!     let numbers = TypedAllocator::<u32>::new();
//!     let storage = numbers.allocate(8)?;
//!     // SAFETY: storage was reserved above for 8 elements.
//!     unsafe { numbers.deallocate(8, storage)? };
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured logging via `tracing`
//!
//! ## Architecture
//!
//! Every fallible operation returns an explicit error value from the
//! [`error`] module. Pools are not synchronized; the only synchronized path
//! is the binding's one-time initialization.

#![allow(unsafe_code)]
#![warn(rust_2018_idioms)]
// Free-list link casts are aligned by construction of the block size
#![allow(clippy::cast_ptr_alignment)]
// #[must_use] on constructors returning must_use errors documents intent
#![allow(clippy::double_must_use)]

// Error types
pub mod error;

pub mod binding;
pub mod config;
pub mod pool;
pub mod pooled;
pub mod system;
pub mod traits;
pub mod typed;
pub mod utils;

pub use crate::binding::{
    FnMemorySystem, MemoryBinding, MemoryContext, allocate, context, deallocate,
    set_memory_context, set_memory_system,
};
pub use crate::config::{PoolConfig, PooledConfig, SizeClass};
pub use crate::error::{
    AllocResult, AllocateError, DeallocResult, DeallocateError, MemoryError, MemoryResult,
    PoolError, PoolResult, Result,
};
pub use crate::pool::{FixedSizePool, InsertError, SlotHandle, SlotPool};
pub use crate::pooled::PooledMemory;
pub use crate::system::{DEFAULT_ALIGN, SystemMemory};
pub use crate::traits::{AllocateFn, DeallocateFn, MemorySystem};
pub use crate::typed::{ElementAllocator, GrowError, TypedAllocator};

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::binding::{MemoryBinding, MemoryContext};
    pub use crate::config::{PoolConfig, PooledConfig};
    pub use crate::error::{
        AllocateError, DeallocateError, MemoryError, MemoryResult, PoolError,
    };
    pub use crate::pool::{FixedSizePool, SlotHandle, SlotPool};
    pub use crate::pooled::PooledMemory;
    pub use crate::system::SystemMemory;
    pub use crate::traits::MemorySystem;
    pub use crate::typed::{ElementAllocator, GrowError, TypedAllocator};

    pub use strata_core::{MultiTypeCell, Outcome};
}

#[cfg(feature = "logging")]
use tracing::{debug, info};

/// Initialize the process-wide binding with the default strategy.
///
/// Idempotent: if a strategy is already active (default or override) this
/// leaves it in place.
///
/// # Examples
///
/// ```rust
/// fn main() -> strata_memory::MemoryResult<()> {
///     strata_memory::init()?;
///     assert!(strata_memory::binding::global().is_initialized());
///     Ok(())
/// }
/// ```
pub fn init() -> MemoryResult<()> {
    #[cfg(feature = "logging")]
    {
        debug!("Initializing strata-memory");
    }

    let _context = binding::context();

    #[cfg(feature = "logging")]
    {
        info!(system = _context.name(), "strata-memory initialized");
    }

    Ok(())
}

/// Initialize the process-wide binding with an explicit strategy.
///
/// Must run before anything else touches the binding.
///
/// # Errors
/// `AlreadyInitialized` if a strategy is already active.
pub fn init_with(context: MemoryContext) -> MemoryResult<()> {
    binding::set_memory_context(context)?;

    #[cfg(feature = "logging")]
    {
        info!(system = binding::context().name(), "strata-memory initialized");
    }

    Ok(())
}
