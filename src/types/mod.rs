//! This module defines the core, strongly-typed data representations used
//! throughout the tabular engine.
//!
//! It includes the canonical `DataType` tag enum (a safe, serializable,
//! Arrow-compatible closed set) and the dynamically-typed `Scalar` cell value
//! used by row-at-a-time surfaces.

pub mod data_type;
pub mod scalar;

// Re-export the main types for easier access.
pub use data_type::DataType;
pub use scalar::{GroupKey, Scalar};
