//! # Certificate entities
//!
//! Typed representation of a certificate: the problem (variables, objective, constraints), the
//! relation to prove, the claimed solutions and the derivation list. Instances are built by the
//! parser in document order.
use std::sync::Arc;

use crate::data::certificate::elements::{Objective, Rtp};
use crate::data::linear_algebra::SparseVector;

pub mod constraint;
pub mod derivation;
pub mod elements;
pub mod solution;

pub use constraint::Constraint;
pub use derivation::{Derivation, Reason, WeakBound};
pub use solution::Solution;

/// A problem variable: a name and whether it is required to take integer values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    pub name: String,
    pub is_integer: bool,
}

/// The objective function of the problem the certificate is about.
#[derive(Clone, Debug)]
pub struct ObjectiveFunction {
    pub direction: Objective,
    /// The single shared allocation every `OBJ` payload references.
    pub coefficients: Arc<SparseVector>,
    /// Whether all coefficients are integers over integer variables only; used for strengthening
    /// cutoff bounds.
    pub is_integral: bool,
}

/// A parsed certificate.
#[derive(Clone, Debug)]
pub struct Certificate {
    /// Format version as read from the `VER` section.
    pub version: (u32, u32),
    pub variables: Vec<Variable>,
    pub objective: ObjectiveFunction,
    /// The original problem constraints, in document order.
    pub constraints: Vec<Constraint>,
    /// Number of constraints declared as bounds in the `CON` header. Not needed for
    /// verification, but carried for the writer.
    pub bound_count: usize,
    pub rtp: Rtp,
    pub solutions: Vec<Solution>,
    pub derivations: Vec<Derivation>,
}

impl Certificate {
    /// Integrality per variable index.
    pub fn integrality(&self) -> Vec<bool> {
        self.variables.iter().map(|variable| variable.is_integer).collect()
    }
}
