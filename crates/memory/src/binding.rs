//! Process-wide allocator binding
//!
//! A [`MemoryBinding`] holds the active [`MemoryContext`]. It starts
//! uninitialized and moves to initialized exactly once, either with the
//! strategy registered through [`MemoryBinding::set`] or, on first use, with
//! its default factory. Concurrent first callers observe a single
//! initialization; after that the active strategy never changes.
//!
//! The process binding is reached through the free functions [`allocate`],
//! [`deallocate`], [`context`] and [`set_memory_system`]. Code that should
//! not depend on process state takes a [`MemoryContext`] explicitly instead.

use core::fmt;
use core::ptr::NonNull;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "logging")]
use tracing::debug;

use crate::error::{
    AllocResult, AllocateError, DeallocResult, DeallocateError, MemoryError, MemoryResult,
};
use crate::system::SystemMemory;
use crate::traits::{AllocateFn, DeallocateFn, MemorySystem};

// ============================================================================
// Function-pair strategy
// ============================================================================

/// Strategy built from a host-supplied allocate/release function pair
#[derive(Clone, Copy)]
pub struct FnMemorySystem {
    allocate: AllocateFn,
    deallocate: DeallocateFn,
}

impl FnMemorySystem {
    /// Pairs the two functions into a strategy
    #[must_use]
    pub const fn new(allocate: AllocateFn, deallocate: DeallocateFn) -> Self {
        Self {
            allocate,
            deallocate,
        }
    }
}

impl MemorySystem for FnMemorySystem {
    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        (self.allocate)(size)
    }

    unsafe fn deallocate(&self, size: usize, ptr: NonNull<u8>) -> DeallocResult<()> {
        // SAFETY: Caller guarantees ptr/size came from the paired allocate
        // function, which is the contract of DeallocateFn.
        unsafe { (self.deallocate)(size, ptr) }
    }

    fn name(&self) -> &'static str {
        "host"
    }
}

impl fmt::Debug for FnMemorySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMemorySystem").finish_non_exhaustive()
    }
}

// ============================================================================
// Context handle
// ============================================================================

/// Shared handle to a memory strategy
///
/// Cloning is cheap and every clone refers to the same strategy. Zero sizes
/// are rejected here, before the strategy is reached, so host functions
/// never observe them.
#[derive(Clone)]
pub struct MemoryContext {
    system: Arc<dyn MemorySystem>,
}

impl MemoryContext {
    /// Wraps a strategy
    pub fn new<M: MemorySystem + 'static>(system: M) -> Self {
        Self {
            system: Arc::new(system),
        }
    }

    /// Wraps an already shared strategy
    pub fn from_arc(system: Arc<dyn MemorySystem>) -> Self {
        Self { system }
    }

    /// Context over the platform allocator
    pub fn system() -> Self {
        Self::new(SystemMemory::new())
    }

    /// Context over a host-supplied function pair
    pub fn from_fns(allocate: AllocateFn, deallocate: DeallocateFn) -> Self {
        Self::new(FnMemorySystem::new(allocate, deallocate))
    }

    /// Reserves `size` bytes through the strategy
    pub fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        if size == 0 {
            return Err(AllocateError::ZeroSize);
        }
        self.system.allocate(size)
    }

    /// Releases memory reserved through this context
    ///
    /// # Safety
    /// - `ptr` must have been returned by [`allocate`](Self::allocate) on a
    ///   context sharing this strategy
    /// - `size` must be the size it was reserved with
    /// - `ptr` must not be used or released again afterwards
    pub unsafe fn deallocate(&self, size: usize, ptr: NonNull<u8>) -> DeallocResult<()> {
        if size == 0 {
            return Err(DeallocateError::ZeroSize);
        }
        // SAFETY: Forwarded from the caller.
        unsafe { self.system.deallocate(size, ptr) }
    }

    /// Strategy name
    pub fn name(&self) -> &'static str {
        self.system.name()
    }

    /// Returns true if both handles refer to the same strategy instance
    pub fn same_system(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.system, &other.system)
    }
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContext")
            .field("system", &self.name())
            .finish()
    }
}

static_assertions::assert_impl_all!(MemoryContext: Send, Sync, Clone);
static_assertions::assert_impl_all!(MemoryBinding: Send, Sync);

// ============================================================================
// Binding
// ============================================================================

/// One-time-initialized slot holding the active memory context
pub struct MemoryBinding {
    active: OnceLock<MemoryContext>,
    default: fn() -> MemoryContext,
}

impl MemoryBinding {
    /// Binding that falls back to the platform allocator
    #[must_use]
    pub const fn new() -> Self {
        Self::with_default(MemoryContext::system)
    }

    /// Binding that calls `default` on first use unless overridden
    #[must_use]
    pub const fn with_default(default: fn() -> MemoryContext) -> Self {
        Self {
            active: OnceLock::new(),
            default,
        }
    }

    /// Registers the strategy to use instead of the default
    ///
    /// Only succeeds while the binding is uninitialized. Once a strategy is
    /// active (by an earlier `set` or by first use) the call is rejected and
    /// the active strategy is left unchanged.
    pub fn set(&self, context: MemoryContext) -> MemoryResult<()> {
        #[cfg(feature = "logging")]
        let name = context.name();

        match self.active.set(context) {
            Ok(()) => {
                #[cfg(feature = "logging")]
                debug!(system = name, "memory binding initialized with override");

                Ok(())
            }
            Err(_rejected) => Err(MemoryError::already_initialized(self.context().name())),
        }
    }

    /// Active context, initializing with the default on first call
    pub fn context(&self) -> &MemoryContext {
        self.active.get_or_init(|| {
            let context = (self.default)();

            #[cfg(feature = "logging")]
            debug!(system = context.name(), "memory binding initialized with default");

            context
        })
    }

    /// Returns true once a strategy is active
    pub fn is_initialized(&self) -> bool {
        self.active.get().is_some()
    }

    /// Reserves `size` bytes through the active strategy
    pub fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        self.context().allocate(size)
    }

    /// Releases memory reserved through this binding
    ///
    /// # Safety
    /// Same contract as [`MemoryContext::deallocate`].
    pub unsafe fn deallocate(&self, size: usize, ptr: NonNull<u8>) -> DeallocResult<()> {
        // SAFETY: Forwarded from the caller.
        unsafe { self.context().deallocate(size, ptr) }
    }
}

impl Default for MemoryBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBinding")
            .field("active", &self.active.get().map(MemoryContext::name))
            .finish()
    }
}

// ============================================================================
// Process binding
// ============================================================================

static GLOBAL: MemoryBinding = MemoryBinding::new();

/// The process-wide binding
pub fn global() -> &'static MemoryBinding {
    &GLOBAL
}

/// Active process-wide context, initializing it on first call
pub fn context() -> &'static MemoryContext {
    GLOBAL.context()
}

/// Reserves `size` bytes through the process-wide strategy
///
/// # Errors
/// - `ZeroSize` if `size == 0`
/// - `BadAllocate` if the reservation fails
pub fn allocate(size: usize) -> AllocResult<NonNull<u8>> {
    GLOBAL.allocate(size)
}

/// Releases memory reserved by [`allocate`]
///
/// # Safety
/// `ptr` must come from [`allocate`] with the same `size` and must not be
/// used or released again.
pub unsafe fn deallocate(size: usize, ptr: NonNull<u8>) -> DeallocResult<()> {
    // SAFETY: Forwarded from the caller.
    unsafe { GLOBAL.deallocate(size, ptr) }
}

/// Installs a host allocate/release pair as the process-wide strategy
///
/// Must run before the first allocation in the process.
pub fn set_memory_system(allocate: AllocateFn, deallocate: DeallocateFn) -> MemoryResult<()> {
    GLOBAL.set(MemoryContext::from_fns(allocate, deallocate))
}

/// Installs an arbitrary strategy as the process-wide strategy
pub fn set_memory_context(context: MemoryContext) -> MemoryResult<()> {
    GLOBAL.set(context)
}
