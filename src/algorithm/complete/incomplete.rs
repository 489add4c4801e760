//! # Incomplete completion
//!
//! An incomplete derivation names the constraints that should carry nonzero multipliers and
//! nothing else. The multipliers are reconstructed by an exact LP solve: optimize the declared
//! coefficient vector over the named rows and read the dual values (or, for an infeasible local
//! LP, the Farkas multipliers) back as the linear combination.
use log::{debug, warn};

use num_traits::Zero;

use crate::algorithm::error::Verification;
use crate::algorithm::oracle::{LpOracle, SolveStatus};
use crate::data::certificate::elements::{ConstraintType, Objective};
use crate::data::certificate::{Certificate, Constraint};
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;

/// A warm start LP owned by one pipeline worker at a time.
///
/// The original problem rows stay loaded permanently; derived rows are swapped in and out
/// between derivations by set difference against the declared active set. `active` is the
/// two-way map between LP rows and certificate indices: LP row `base_rows + k` holds the
/// derived constraint with certificate index `active[k]`, and rows below `base_rows` map to
/// certificate indices directly.
pub struct LpContext<O> {
    oracle: O,
    base_rows: usize,
    active: Vec<usize>,
}

impl<O: LpOracle> LpContext<O> {
    /// Load the problem variables and all original constraints into a fresh oracle.
    pub fn new(certificate: &Certificate, mut oracle: O) -> Self {
        oracle.add_columns(certificate.variables.len());
        for constraint in &certificate.constraints {
            add_constraint_row(&mut oracle, constraint);
        }

        Self { oracle, base_rows: certificate.constraints.len(), active: Vec::new() }
    }

    fn certificate_index(&self, row: usize) -> usize {
        if row < self.base_rows {
            row
        } else {
            self.active[row - self.base_rows]
        }
    }
}

fn add_constraint_row<O: LpOracle>(oracle: &mut O, constraint: &Constraint) {
    let empty = SparseVector::empty();
    let coefficients = match constraint.coefficients() {
        Some(coefficients) => coefficients.as_ref(),
        None => &empty,
    };
    let rhs = constraint.rhs().clone();
    match constraint.sense() {
        ConstraintType::Equal => oracle.add_row(coefficients, Some(rhs.clone()), Some(rhs)),
        ConstraintType::Less => oracle.add_row(coefficients, None, Some(rhs)),
        ConstraintType::Greater => oracle.add_row(coefficients, Some(rhs), None),
    }
}

/// Reconstruct the multipliers of one incomplete derivation.
///
/// # Return value
///
/// `Some` multipliers on a terminal oracle status. `None` when the oracle gave up; the
/// derivation is then re-emitted unchanged.
pub(super) fn complete_incomplete<O: LpOracle>(
    context: &mut LpContext<O>,
    declared: &Constraint,
    active_set: &[usize],
    constraints: &[Constraint],
    number_of_variables: usize,
) -> Result<Option<SparseVector>, Verification> {
    // Entries below the original constraint count are base rows and always loaded; only
    // derived rows are swapped.
    let mut desired: Vec<usize> =
        active_set.iter().copied().filter(|&index| index >= context.base_rows).collect();
    desired.sort_unstable();
    desired.dedup();

    let removals: Vec<usize> = context
        .active
        .iter()
        .enumerate()
        .filter(|&(_, certificate_index)| desired.binary_search(certificate_index).is_err())
        .map(|(position, _)| context.base_rows + position)
        .collect();
    context.oracle.remove_rows(&removals);
    context.active.retain(|certificate_index| desired.binary_search(certificate_index).is_ok());

    for &certificate_index in &desired {
        if !context.active.contains(&certificate_index) {
            add_constraint_row(&mut context.oracle, &constraints[certificate_index]);
            context.active.push(certificate_index);
        }
    }
    debug_assert_eq!(context.oracle.row_count(), context.base_rows + context.active.len());

    // The local LP optimizes the declared coefficients towards the declared sense.
    let empty = SparseVector::empty();
    let objective = match declared.coefficients() {
        Some(coefficients) => coefficients.as_ref(),
        None => &empty,
    };
    let direction = if declared.sense() == ConstraintType::Less {
        Objective::Maximize
    } else {
        Objective::Minimize
    };
    context.oracle.set_objective(objective, direction);

    let status = context.oracle.solve();
    let (duals, reduced) = match status {
        SolveStatus::Optimal => {
            debug!("completed {} with an optimal dual", declared.label());
            (context.oracle.dual_values(), context.oracle.reduced_costs())
        }
        SolveStatus::Infeasible => {
            debug!("completed {} with a Farkas certificate", declared.label());
            (
                context.oracle.farkas_multipliers(),
                vec![Rational::zero(); number_of_variables],
            )
        }
        SolveStatus::Other => {
            warn!(
                "completion attempt of derivation {} returned a non-terminal status, skipping",
                declared.label(),
            );
            return Ok(None);
        }
    };

    // Reduced costs per variable first, dual multipliers per row second; on the rare index
    // collision the dual wins, matching how a multiplier list is read back in.
    let mut completed = SparseVector::empty();
    for (variable, value) in reduced.iter().enumerate().take(number_of_variables) {
        completed.set(variable, value.clone());
    }
    for (row, value) in duals.iter().enumerate() {
        completed.set(context.certificate_index(row), value.clone());
    }

    Ok(Some(completed))
}
