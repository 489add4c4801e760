//! # Derivations
//!
//! A derivation is a proof step: a new constraint together with the reason it follows from the
//! constraints before it.
use crate::data::certificate::constraint::Constraint;
use crate::data::certificate::elements::BoundDirection;
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;

/// A single proof step.
#[derive(Clone, Debug)]
pub struct Derivation {
    /// The constraint this step claims to derive.
    pub constraint: Constraint,
    pub reason: Reason,
    /// Index of the last later derivation permitted to reference this one; negative disables
    /// trashing.
    pub max_ref_idx: i64,
}

/// Why a derived constraint holds.
#[derive(Clone, Debug)]
pub enum Reason {
    /// The constraint is assumed; its assumption set is itself.
    Assumption,
    /// A linear combination of earlier constraints. The multipliers map constraint indices to
    /// rational weights.
    Lin(SparseVector),
    /// A linear combination whose multipliers are missing; only the indices of the constraints
    /// that should carry nonzero multipliers are known.
    LinIncomplete(Vec<usize>),
    /// A linear combination whose multipliers require correction with variable bounds.
    LinWeak {
        /// Specific bounds to use for particular variables, overriding the global bound table.
        bounds: Vec<WeakBound>,
        multipliers: SparseVector,
    },
    /// A linear combination followed by integer rounding of the right hand side.
    Rnd(SparseVector),
    /// The constraint follows from two earlier constraints valid on complementary sides of an
    /// integer disjunction.
    Uns {
        constraint_1: usize,
        assumption_1: usize,
        constraint_2: usize,
        assumption_2: usize,
    },
    /// A cutoff bound justified by the best primal solution.
    Sol,
}

impl Reason {
    /// Whether this reason still needs its multipliers reconstructed.
    pub fn needs_completion(&self) -> bool {
        matches!(self, Reason::LinIncomplete(_) | Reason::LinWeak { .. })
    }
}

/// A variable bound a weak derivation corrects with.
#[derive(Clone, Debug)]
pub struct WeakBound {
    pub direction: BoundDirection,
    pub variable: usize,
    /// Certificate index of the bound constraint the correcting multiplier lands on.
    pub constraint: usize,
    pub value: Rational,
}
