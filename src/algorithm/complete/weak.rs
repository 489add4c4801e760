//! # Weak completion
//!
//! A weak derivation carries multipliers whose aggregate differs from the declared constraint
//! only in ways variable bounds can repair. No LP is solved: per differing coefficient, a bound
//! of the right direction is selected, its multiplier is accumulated, and the corrected right
//! hand side is checked against the declared one.
use num_traits::{One, Zero};

use crate::algorithm::complete::bounds::GlobalBounds;
use crate::algorithm::error::{Verification, WeakError};
use crate::data::certificate::derivation::WeakBound;
use crate::data::certificate::elements::{BoundDirection, ConstraintType};
use crate::data::certificate::Constraint;
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;

/// Bounds available to one weak completion: the payload's explicit per-variable choices, backed
/// by the global table.
struct BoundSelection<'a> {
    local: &'a [WeakBound],
    globals: &'a GlobalBounds,
}

impl BoundSelection<'_> {
    /// The bound to correct a variable with: (certificate index, bound value, multiplier
    /// factor). Payload bounds take precedence and always carry factor one.
    fn select(
        &self,
        direction: BoundDirection,
        variable: usize,
    ) -> Option<(usize, Rational, Rational)> {
        for bound in self.local {
            if bound.direction == direction && bound.variable == variable {
                return Some((bound.constraint, bound.value.clone(), Rational::one()));
            }
        }
        self.globals
            .get(direction, variable)
            .map(|entry| (entry.constraint, entry.value.clone(), entry.multiplier.clone()))
    }
}

/// Reconstruct the full multiplier list of a weak derivation.
///
/// # Return value
///
/// The multipliers with all bound corrections accumulated; they derive a constraint dominating
/// the declared one.
pub(super) fn complete_weak(
    declared: &Constraint,
    bounds: &[WeakBound],
    multipliers: &SparseVector,
    constraints: &[Constraint],
    globals: &GlobalBounds,
) -> Result<SparseVector, Verification> {
    let label = declared.label().to_string();
    let empty = SparseVector::empty();
    let declared_coefficients = match declared.coefficients() {
        Some(coefficients) => coefficients.as_ref(),
        None => &empty,
    };
    let selection = BoundSelection { local: bounds, globals };

    // Aggregate the given multipliers; the sign check is seeded with the declared sense.
    let mut sense = declared.sense().sign();
    let mut completed = SparseVector::empty();
    let mut aggregated = SparseVector::empty();
    let mut corrected_side = Rational::zero();

    for (reference, multiplier) in multipliers.iter() {
        if multiplier.is_zero() {
            continue;
        }
        let constraint = &constraints[*reference];
        let vector = match constraint.coefficients() {
            Some(vector) => vector,
            None => {
                return Err(Verification::TrashedReference {
                    derivation: label.clone(),
                    index: *reference,
                    label: constraint.label().to_string(),
                });
            }
        };

        let contribution = constraint.sense().sign() * multiplier.signum();
        if sense == 0 {
            sense = contribution;
        } else if contribution != 0 && contribution != sense {
            return Err(Verification::SignConflict { derivation: label.clone(), index: *reference });
        }

        aggregated.add_multiple(multiplier, vector);
        corrected_side += multiplier * constraint.rhs();
        completed.set(*reference, multiplier.clone());
    }

    // First pass: every aggregated coefficient that differs from the declared one. The
    // aggregate is updated in place so that the second pass skips repaired indices.
    let entries: Vec<_> = aggregated.iter().cloned().collect();
    for (index, derived_value) in entries {
        let declared_value = declared_coefficients.value_at(index);
        if derived_value != declared_value {
            let delta = &declared_value - &derived_value;
            correct(declared, &label, index, delta, &selection, &mut completed, &mut corrected_side)?;
            aggregated.set(index, declared_value);
        }
    }

    // Second pass: declared support the aggregate never touched. Both directions are needed;
    // either alone misses corrections.
    for (index, declared_value) in declared_coefficients.iter() {
        let derived_value = aggregated.value_at(*index);
        if &derived_value != declared_value {
            let delta = declared_value - &derived_value;
            correct(declared, &label, *index, delta, &selection, &mut completed, &mut corrected_side)?;
        }
    }

    // The corrected side must lie on the dominating side of the declared right hand side. An
    // empty declared constraint may instead certify infeasibility outright.
    let violated = match declared.sense() {
        ConstraintType::Less => &corrected_side > declared.rhs(),
        ConstraintType::Greater => &corrected_side < declared.rhs(),
        ConstraintType::Equal => false,
    };
    if violated {
        if declared_coefficients.is_empty() {
            let still_infeasible = match declared.sense() {
                ConstraintType::Less => corrected_side.is_negative(),
                ConstraintType::Greater => corrected_side.is_positive(),
                ConstraintType::Equal => false,
            };
            if !still_infeasible {
                return Err(Verification::WeakCompletion {
                    derivation: label,
                    error: WeakError::InvalidInfeasibility { corrected: corrected_side },
                });
            }
        } else {
            return Err(Verification::WeakCompletion {
                derivation: label,
                error: WeakError::DoesNotDominate {
                    corrected: corrected_side,
                    declared: declared.rhs().clone(),
                },
            });
        }
    }

    Ok(completed)
}

/// Apply one bound correction of size `delta` at `index`.
fn correct(
    declared: &Constraint,
    label: &str,
    index: usize,
    delta: Rational,
    selection: &BoundSelection,
    completed: &mut SparseVector,
    corrected_side: &mut Rational,
) -> Result<(), Verification> {
    let direction = match declared.sense() {
        // A ≤ constraint absorbs a deficit with the lower bound, an excess with the upper.
        ConstraintType::Less => {
            if delta.is_positive() {
                BoundDirection::Upper
            } else {
                BoundDirection::Lower
            }
        }
        ConstraintType::Greater => {
            if delta.is_negative() {
                BoundDirection::Upper
            } else {
                BoundDirection::Lower
            }
        }
        ConstraintType::Equal => {
            return Err(Verification::WeakCompletion {
                derivation: label.to_string(),
                error: WeakError::EqualitySense,
            });
        }
    };

    let (bound_constraint, bound_value, factor) =
        selection.select(direction, index).ok_or_else(|| Verification::WeakCompletion {
            derivation: label.to_string(),
            error: WeakError::MissingBound {
                variable: index,
                lower: direction == BoundDirection::Lower,
            },
        })?;

    let accumulated = completed.value_at(bound_constraint) + &delta / &factor;
    completed.set(bound_constraint, accumulated);
    *corrected_side += &delta * &bound_value;

    Ok(())
}
