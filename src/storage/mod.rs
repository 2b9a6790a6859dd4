//! Chunked columnar storage: copy-on-write value buffers and the per-type
//! container that pairs them with validity bitmaps.

pub mod buffer;
pub mod container;

pub use container::PrimitiveContainer;
