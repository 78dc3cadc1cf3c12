//! Index-based slot pool
//!
//! Safe counterpart to [`FixedSizePool`](super::FixedSizePool): values live
//! in a fixed-capacity vector and vacant slots are chained through their
//! indices, so insertion and removal are O(1) without raw pointers.
//! A [`SlotHandle`] remembers which pool issued it; handing it to another
//! pool is reported as an ownership error.

use core::fmt;
use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::{PoolError, PoolResult};

/// Identifier of the pool that issued a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolId(NonZeroU32);

impl PoolId {
    fn next() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        // Restart from 1 on wraparound
        Self(NonZeroU32::new(id).unwrap_or(NonZeroU32::MIN))
    }
}

/// Handle to a value stored in a [`SlotPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    pool: PoolId,
    index: u32,
}

impl SlotHandle {
    /// Slot index inside the issuing pool
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

enum Slot<T> {
    Occupied(T),
    Vacant { next: Option<u32> },
}

/// Insertion into a full pool; gives the rejected value back
pub struct InsertError<T> {
    value: T,
    error: PoolError,
}

impl<T> InsertError<T> {
    /// The underlying pool error
    pub fn error(&self) -> PoolError {
        self.error
    }

    /// Recovers the value that could not be stored
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert rejected: {}", self.error)
    }
}

impl<T> std::error::Error for InsertError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<InsertError<T>> for PoolError {
    fn from(err: InsertError<T>) -> Self {
        err.error
    }
}

/// Fixed-capacity pool of typed slots
pub struct SlotPool<T> {
    id: PoolId,
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> SlotPool<T> {
    /// Creates a pool with `capacity` vacant slots
    ///
    /// Capacity is clamped to `u32::MAX` slots.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(u32::MAX as usize) as u32;
        let slots = (0..capacity)
            .map(|index| Slot::Vacant {
                next: (index + 1 < capacity).then_some(index + 1),
            })
            .collect();

        Self {
            id: PoolId::next(),
            slots,
            free_head: (capacity > 0).then_some(0),
            len: 0,
        }
    }

    /// Stores a value in a vacant slot
    ///
    /// # Errors
    /// `EmptyPool` when every slot is occupied; the value is handed back
    /// inside the error.
    pub fn insert(&mut self, value: T) -> Result<SlotHandle, InsertError<T>> {
        let Some(index) = self.free_head else {
            return Err(InsertError {
                value,
                error: PoolError::empty_pool(self.capacity()),
            });
        };

        let slot = &mut self.slots[index as usize];
        let Slot::Vacant { next } = *slot else {
            unreachable!("free chain points at an occupied slot");
        };
        *slot = Slot::Occupied(value);
        self.free_head = next;
        self.len += 1;

        Ok(SlotHandle {
            pool: self.id,
            index,
        })
    }

    /// Removes and returns the value behind a handle
    ///
    /// # Errors
    /// - `Ownership` if the handle was issued by another pool
    /// - `VacantSlot` if the slot was already freed
    pub fn remove(&mut self, handle: SlotHandle) -> PoolResult<T> {
        self.check_owner(handle)?;

        let slot = &mut self.slots[handle.index()];
        match core::mem::replace(
            slot,
            Slot::Vacant {
                next: self.free_head,
            },
        ) {
            Slot::Occupied(value) => {
                self.free_head = Some(handle.index);
                self.len -= 1;
                Ok(value)
            }
            vacant @ Slot::Vacant { .. } => {
                *slot = vacant;
                Err(PoolError::VacantSlot {
                    index: handle.index(),
                })
            }
        }
    }

    /// Borrows the value behind a handle
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        if handle.pool != self.id {
            return None;
        }
        match self.slots.get(handle.index())? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Mutably borrows the value behind a handle
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        if handle.pool != self.id {
            return None;
        }
        match self.slots.get_mut(handle.index())? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Number of occupied slots
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of vacant slots
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity() - self.len
    }

    /// Total number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot is occupied
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if every slot is occupied
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    fn check_owner(&self, handle: SlotHandle) -> PoolResult<()> {
        if handle.pool == self.id && handle.index() < self.capacity() {
            Ok(())
        } else {
            Err(PoolError::ownership(handle.index(), 0, self.capacity()))
        }
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut pool = SlotPool::new(2);
        let handle = pool.insert("first".to_string()).unwrap();

        assert_eq!(pool.get(handle).map(String::as_str), Some("first"));
        pool.get_mut(handle).unwrap().push_str("!");
        assert_eq!(pool.remove(handle).unwrap(), "first!");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_full_pool_returns_value() {
        let mut pool = SlotPool::new(1);
        pool.insert(1_u32).unwrap();

        let rejected = pool.insert(2).unwrap_err();
        assert_eq!(rejected.error(), PoolError::EmptyPool { capacity: 1 });
        assert_eq!(rejected.into_inner(), 2);
        assert!(pool.is_full());
    }

    #[test]
    fn test_vacant_slot_reported() {
        let mut pool = SlotPool::new(4);
        let handle = pool.insert(7_u8).unwrap();
        pool.remove(handle).unwrap();

        assert_eq!(
            pool.remove(handle),
            Err(PoolError::VacantSlot { index: 0 })
        );
        assert_eq!(pool.get(handle), None);
        assert_eq!(pool.free_slots(), 4);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut first = SlotPool::new(4);
        let mut second = SlotPool::<u8>::new(4);
        let handle = first.insert(1_u8).unwrap();

        let error = second.remove(handle).unwrap_err();
        assert_eq!(error.code(), "MEM:POOL:OWNERSHIP");
        assert_eq!(second.get(handle), None);
        assert_eq!(first.get(handle), Some(&1));
    }

    #[test]
    fn test_freed_slot_is_reused_first() {
        let mut pool = SlotPool::new(3);
        let a = pool.insert('a').unwrap();
        let _b = pool.insert('b').unwrap();
        pool.remove(a).unwrap();

        let c = pool.insert('c').unwrap();
        assert_eq!(c.index(), a.index());
    }

    #[test]
    fn test_zero_capacity() {
        let mut pool = SlotPool::new(0);
        assert!(pool.is_full());
        assert!(pool.insert(()).is_err());
    }
}
