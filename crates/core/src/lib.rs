//! # strata-core
//!
//! Exception-free value carriers shared by every strata crate.
//!
//! ## Key Components
//!
//! - **[`Outcome`]**: two-outcome result carrier whose payload is consumed
//!   exactly once
//! - **[`multi_type_cell!`]**: declares a tagged cell over a fixed list of
//!   unrelated types, with compile-time member positions
//! - **[`max_size_of!`]**: largest size among a list of types
//!
//! ## Usage
//!
//! ```rust
//! use strata_core::{Outcome, multi_type_cell};
//!
//! multi_type_cell! {
//!     #[derive(Debug)]
//!     pub enum Reason {
//!         Code(u32),
//!         Message(&'static str),
//!     }
//! }
//!
//! let mut outcome: Outcome<u64, Reason> = Outcome::failure(Reason::from(404_u32));
//! let mut reason = outcome.take_failure().expect("failure payload");
//! assert_eq!(reason.at::<0>().ok(), Some(404));
//! ```

pub mod cell;
mod error;
pub mod outcome;

pub use cell::{CellAt, MultiTypeCell};
pub use error::{CellError, ConsumedOutcome};
pub use outcome::Outcome;

/// Common prelude for strata crates
pub mod prelude {
    pub use super::{CellAt, CellError, ConsumedOutcome, MultiTypeCell, Outcome};
    pub use crate::{max_size_of, multi_type_cell};
}
