//! # The exact LP oracle
//!
//! The completion engine asks an oracle to solve small exact rational linear programs: the
//! columns are the problem variables (free in both directions), the rows are a changing subset
//! of certificate constraints, and the objective is the coefficient vector of the derivation
//! being completed.
//!
//! The oracle is a seam: the engine only relies on the `LpOracle` trait and never inspects
//! anything numeric beyond the rational duals and reduced costs. The built-in implementation is
//! an exact two-phase simplex.
use crate::data::certificate::elements::Objective;
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;

pub mod simplex;

pub use simplex::SimplexOracle;

/// Outcome of an exact solve.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// Any non-terminal outcome: the unbounded case, or an oracle giving up.
    Other,
}

/// An exact rational LP solver, driven incrementally.
///
/// Rows are identified by their position: removing rows shifts all later rows down, in order.
/// Columns are created once and are unbounded in both directions.
pub trait LpOracle {
    /// Append `count` free columns.
    fn add_columns(&mut self, count: usize);

    /// Append a row `lower ≤ coefficients · x ≤ upper`, where `None` is unbounded. Equalities
    /// have both sides equal; the oracle is never given a two-sided inequality.
    fn add_row(&mut self, coefficients: &SparseVector, lower: Option<Rational>, upper: Option<Rational>);

    /// Remove the rows at the given positions. The positions are sorted and unique; remaining
    /// rows keep their relative order.
    fn remove_rows(&mut self, indices: &[usize]);

    /// Replace the objective. Coefficients at absent indices are zero.
    fn set_objective(&mut self, coefficients: &SparseVector, direction: Objective);

    fn row_count(&self) -> usize;

    /// Solve exactly.
    fn solve(&mut self) -> SolveStatus;

    /// Dual multipliers per row after an `Optimal` solve.
    ///
    /// The multipliers aggregate the rows into a bound on the objective: their signs follow the
    /// row senses, summing the rows weighted by them yields the objective coefficient vector,
    /// and the weighted right hand sides sum to the optimal value.
    fn dual_values(&self) -> Vec<Rational>;

    /// A Farkas certificate per row after an `Infeasible` solve: aggregating the rows with
    /// these multipliers yields an empty constraint with a contradictory right hand side.
    fn farkas_multipliers(&self) -> Vec<Rational>;

    /// Reduced costs per column after an `Optimal` solve. Zero for columns free in both
    /// directions, which is the only kind this crate creates.
    fn reduced_costs(&self) -> Vec<Rational>;
}
