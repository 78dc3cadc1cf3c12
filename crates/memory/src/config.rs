//! Pool configuration
//!
//! [`PoolConfig`] describes a single [`FixedSizePool`](crate::FixedSizePool);
//! [`PooledConfig`] lists the size classes served by
//! [`PooledMemory`](crate::PooledMemory).

use crate::error::{MemoryError, MemoryResult};

/// Configuration for a fixed-size block pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Requested block size in bytes (rounded up to hold a free-list link)
    pub block_size: usize,

    /// Number of blocks
    pub capacity: usize,

    /// Fill pattern byte for newly allocated memory (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for deallocated memory (for debugging)
    pub dealloc_pattern: Option<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_size: 64,
            capacity: 256,
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
        }
    }
}

impl PoolConfig {
    /// Configuration with the given geometry and default fill behaviour
    #[must_use]
    pub fn new(block_size: usize, capacity: usize) -> Self {
        Self {
            block_size,
            capacity,
            ..Self::default()
        }
    }

    /// Production configuration - no fill patterns
    #[must_use]
    pub fn production() -> Self {
        Self {
            alloc_pattern: None,
            dealloc_pattern: None,
            ..Self::default()
        }
    }

    /// Debug configuration - fill patterns always on
    #[must_use]
    pub fn debug() -> Self {
        Self {
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
            ..Self::default()
        }
    }

    /// Set block size
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set fill pattern written into blocks on hand-out
    #[must_use]
    pub fn with_alloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.alloc_pattern = pattern;
        self
    }

    /// Set fill pattern written into blocks on return
    #[must_use]
    pub fn with_dealloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.dealloc_pattern = pattern;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> MemoryResult<()> {
        if self.block_size == 0 {
            return Err(MemoryError::invalid_config("block size must be non-zero"));
        }
        if self.capacity == 0 {
            return Err(MemoryError::invalid_config("capacity must be non-zero"));
        }
        if self.block_size.checked_mul(self.capacity).is_none() {
            return Err(MemoryError::invalid_config(
                "block size times capacity overflows",
            ));
        }
        Ok(())
    }
}

/// One size class of a [`PooledMemory`](crate::PooledMemory)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass {
    /// Largest request served by this class
    pub block_size: usize,
    /// Blocks reserved for this class
    pub capacity: usize,
}

/// Size classes routed to dedicated pools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledConfig {
    /// Classes in strictly increasing block-size order
    pub classes: Vec<SizeClass>,

    /// Fill byte written to blocks handed out by any class pool
    pub alloc_pattern: Option<u8>,
    /// Fill byte written to blocks returned to any class pool
    pub dealloc_pattern: Option<u8>,
}

impl Default for PooledConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl PooledConfig {
    /// Empty configuration, to be filled with [`with_class`](Self::with_class)
    #[must_use]
    pub fn builder() -> Self {
        Self {
            classes: Vec::new(),
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Power-of-two classes from 16 to 256 bytes
    #[must_use]
    pub fn standard() -> Self {
        Self::builder()
            .with_class(16, 256)
            .with_class(32, 256)
            .with_class(64, 128)
            .with_class(128, 64)
            .with_class(256, 32)
    }

    /// Adds a size class
    #[must_use]
    pub fn with_class(mut self, block_size: usize, capacity: usize) -> Self {
        self.classes.push(SizeClass {
            block_size,
            capacity,
        });
        self
    }

    /// Set fill patterns for every class pool
    #[must_use]
    pub fn with_patterns(mut self, alloc: Option<u8>, dealloc: Option<u8>) -> Self {
        self.alloc_pattern = alloc;
        self.dealloc_pattern = dealloc;
        self
    }

    /// Pool configuration for one class
    pub(crate) fn pool_config(&self, class: SizeClass) -> PoolConfig {
        PoolConfig::new(class.block_size, class.capacity)
            .with_alloc_pattern(self.alloc_pattern)
            .with_dealloc_pattern(self.dealloc_pattern)
    }

    /// Validate configuration
    pub fn validate(&self) -> MemoryResult<()> {
        if self.classes.is_empty() {
            return Err(MemoryError::invalid_config("at least one size class is required"));
        }
        for class in &self.classes {
            self.pool_config(*class).validate()?;
        }
        if self
            .classes
            .windows(2)
            .any(|pair| pair[0].block_size >= pair[1].block_size)
        {
            return Err(MemoryError::invalid_config(
                "size classes must be strictly increasing",
            ));
        }
        Ok(())
    }
}
