//! # Storing of certificates in memory
//!
//! This module provides the data structures used to represent certificates in memory. Algorithms
//! may introduce their specific data structures in `algorithm::my_algorithm`.

pub mod certificate;
pub mod linear_algebra;
pub mod number_types;
