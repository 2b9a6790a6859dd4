//! This module defines the single, unified error type for the entire tabular library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabularError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Unsupported operation for this data type: {0}")]
    UnsupportedOperation(String),

    #[error("Row index {index} out of range for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Malformed buffer geometry: {0}")]
    InvalidBuffer(String),

    #[error("Columns cannot shrink: current length {current}, requested {requested}")]
    ShrinkNotAllowed { current: usize, requested: usize },

    #[error("Bad comparator: non-monotonic ordering detected during partitioning")]
    BadComparator,

    #[error("No column named '{0}'")]
    ColumnNotFound(String),

    #[error("Table already contains a column called '{0}'")]
    DuplicateColumnName(String),

    #[error("Division by zero at row {0}")]
    DivideByZero(usize),

    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for TabularError {
    fn from(err: bytemuck::PodCastError) -> Self {
        TabularError::PodCast(err.to_string())
    }
}
