//! Error types for strata-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. Every fallible
//! operation returns one of these as an explicit value; nothing in this crate
//! retries or aborts on its own.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, trace, warn};

// ============================================================================
// Allocation Errors
// ============================================================================

/// Errors returned when reserving memory
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocateError {
    /// A size of zero was requested
    #[error("allocation size must be non-zero")]
    ZeroSize,

    /// The underlying reservation failed
    #[error("allocation of {size} bytes with {align} byte alignment failed")]
    BadAllocate { size: usize, align: usize },

    /// Scaling a request by its element size overflowed
    #[error("size overflow: {count} elements of {element_size} bytes")]
    SizeOverflow { count: usize, element_size: usize },

    /// The requested alignment is stricter than the binding guarantees
    #[error("unsupported alignment {align} (max: {max})")]
    UnsupportedAlignment { align: usize, max: usize },
}

impl AllocateError {
    /// Create a failed reservation error
    pub fn bad_allocate(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "memory reservation failed");

        Self::BadAllocate { size, align }
    }

    /// Create a size overflow error
    pub const fn size_overflow(count: usize, element_size: usize) -> Self {
        Self::SizeOverflow {
            count,
            element_size,
        }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroSize => "MEM:ALLOC:ZERO_SIZE",
            Self::BadAllocate { .. } => "MEM:ALLOC:FAILED",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::UnsupportedAlignment { .. } => "MEM:ALLOC:ALIGN",
        }
    }
}

/// Errors returned when releasing memory
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeallocateError {
    /// A size of zero was supplied
    #[error("deallocation size must be non-zero")]
    ZeroSize,

    /// The underlying release failed
    #[error("release of {size} bytes failed")]
    BadDeallocate { size: usize },

    /// The element count of a typed release does not fit in `usize` bytes
    #[error("release of {count} elements of {element_size} bytes overflows")]
    SizeOverflow { count: usize, element_size: usize },
}

impl DeallocateError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroSize => "MEM:DEALLOC:ZERO_SIZE",
            Self::BadDeallocate { .. } => "MEM:DEALLOC:FAILED",
            Self::SizeOverflow { .. } => "MEM:DEALLOC:OVERFLOW",
        }
    }
}

// ============================================================================
// Pool Errors
// ============================================================================

/// Errors returned by block and slot pools
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolError {
    /// Every block is handed out
    #[error("pool exhausted (capacity: {capacity})")]
    EmptyPool { capacity: usize },

    /// The address lies outside the pool's buffer
    #[error("address {address:#x} outside pool range [{range_min:#x}, {range_max:#x})")]
    Ownership {
        address: usize,
        range_min: usize,
        range_max: usize,
    },

    /// A block was returned while every block is already free
    #[error("block returned to a full pool (capacity: {capacity})")]
    PoolFull { capacity: usize },

    /// The address lies inside the buffer but not on a block boundary
    #[error("address {address:#x} is not on a {block_size} byte block boundary")]
    Misaligned { address: usize, block_size: usize },

    /// The slot addressed by a handle holds no value
    #[error("slot {index} is vacant")]
    VacantSlot { index: usize },
}

impl PoolError {
    /// Create pool exhausted error
    pub fn empty_pool(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        trace!(capacity, "memory pool exhausted");

        Self::EmptyPool { capacity }
    }

    /// Create returned-to-full-pool error
    pub fn pool_full(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, "block returned to a pool with no outstanding blocks");

        Self::PoolFull { capacity }
    }

    /// Create foreign address error
    pub const fn ownership(address: usize, range_min: usize, range_max: usize) -> Self {
        Self::Ownership {
            address,
            range_min,
            range_max,
        }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyPool { .. } => "MEM:POOL:EMPTY",
            Self::Ownership { .. } => "MEM:POOL:OWNERSHIP",
            Self::PoolFull { .. } => "MEM:POOL:FULL",
            Self::Misaligned { .. } => "MEM:POOL:MISALIGNED",
            Self::VacantSlot { .. } => "MEM:POOL:VACANT",
        }
    }
}

// ============================================================================
// Umbrella Error
// ============================================================================

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error(transparent)]
    Allocate(#[from] AllocateError),

    #[error(transparent)]
    Deallocate(#[from] DeallocateError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The process-wide binding was already initialized
    #[error("memory system already initialized with '{active}'")]
    AlreadyInitialized { active: &'static str },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Only an exhausted pool can be resolved by the caller, by falling back
    /// to another strategy or replacing the pool.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Pool(PoolError::EmptyPool { .. }))
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Allocate(e) => e.code(),
            Self::Deallocate(e) => e.code(),
            Self::Pool(e) => e.code(),
            Self::AlreadyInitialized { .. } => "MEM:SYSTEM:INIT",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
        }
    }

    /// Create already initialized error
    pub fn already_initialized(active: &'static str) -> Self {
        #[cfg(feature = "logging")]
        warn!(active, "memory system override rejected, binding already initialized");

        Self::AlreadyInitialized { active }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of a reservation
pub type AllocResult<T> = core::result::Result<T, AllocateError>;

/// Result of a release
pub type DeallocResult<T> = core::result::Result<T, DeallocateError>;

/// Result of a pool operation
pub type PoolResult<T> = core::result::Result<T, PoolError>;

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;
