//! # Linear algebra primitives
//!
//! Sparse vectors of exact rationals. Certificates never materialize dense data; every
//! coefficient collection in this crate is sparse.
pub mod vector;

pub use vector::SparseVector;

/// Inner value for the `SparseVector` type.
pub type SparseTuple<F> = (usize, F);
