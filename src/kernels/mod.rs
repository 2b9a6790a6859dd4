//! Type-generic compute kernels operating on chunked containers.

pub mod aggregate;
pub mod sort;
