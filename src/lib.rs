//! This file is the root of the `tabular` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`storage`, `column`,
//!     `frame`, `kernels`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the small public surface users interact with.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod column;
pub mod frame;
pub mod kernels;

mod error;
mod null_handling;
mod storage;
mod traits;
mod types;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use bridge::{FieldDescriptor, RowCursor, RowSource};
pub use column::{ArrowStringColumn, BooleanColumn, Column, PrimitiveColumn, StringColumn};
pub use error::TabularError;
pub use frame::{DataFrame, GroupBy, GroupMap, JoinAlgorithm};
pub use null_handling::Bitmap;
pub use traits::NativeType;
pub use types::{DataType, Scalar};
