//! Error types for the value carriers

use thiserror::Error;

/// Errors produced by multi-type cells
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// The requested position is not the active one
    #[error("type mismatch: requested position {requested}, active {}", describe_active(.active))]
    TypeMismatch {
        /// Position passed to the extraction
        requested: usize,
        /// Position currently held, `None` when the cell is empty
        active: Option<usize>,
    },
}

impl CellError {
    /// Create a type mismatch error
    pub const fn type_mismatch(requested: usize, active: Option<usize>) -> Self {
        Self::TypeMismatch { requested, active }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "CORE:CELL:TYPE_MISMATCH",
        }
    }
}

fn describe_active(active: &Option<usize>) -> String {
    active.map_or_else(|| "none (empty)".to_string(), |index| index.to_string())
}

/// A consumed [`Outcome`](crate::Outcome) was converted into a `Result`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[error("outcome payload was already consumed")]
pub struct ConsumedOutcome;
