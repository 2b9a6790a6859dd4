//! Nullability handling: the Arrow-compatible validity bitmap used by every
//! column container.

pub mod bitmap;

pub use bitmap::Bitmap;
