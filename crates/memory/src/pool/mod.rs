//! Block and slot pools
//!
//! - [`FixedSizePool`]: raw fixed-size blocks over an intrusive free list
//! - [`SlotPool`]: typed values addressed by [`SlotHandle`]
//!
//! Neither pool synchronizes internally.

mod fixed;
pub mod slot;

pub use fixed::FixedSizePool;
pub use slot::{InsertError, SlotHandle, SlotPool};
