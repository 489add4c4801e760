//! # Representation of claimed solutions
//!
//! Certificates list candidate integer feasible points. They are checked against the original
//! constraints and used to justify cutoff bounds; they are immutable after loading.
use crate::data::linear_algebra::SparseVector;

/// A labelled assignment over the problem variables. Absent variables are zero.
#[derive(Clone, Debug)]
pub struct Solution {
    pub label: String,
    pub assignment: SparseVector,
}
