//! The public interop boundary: Arrow array conversion and row-oriented
//! ingestion. Everything external data touches on its way in or out goes
//! through here.

pub mod arrow_impl;
pub mod row_cursor;

pub use arrow_impl::{from_arrow, to_arrow};
pub use row_cursor::{FieldDescriptor, RowCursor, RowSource};
