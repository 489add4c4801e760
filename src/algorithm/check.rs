//! # The derivation checker
//!
//! A single-threaded walk over the derivation list. Every derivation is reconstructed from its
//! reason using only earlier constraints, the reconstruction must dominate the declared
//! constraint, and assumption sets are propagated until they are discharged. The walk ends
//! early as soon as the relation to prove is established.
use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info};
use num_traits::{One, Zero};

use crate::algorithm::error::{CutoffError, UnsplitError, Verification};
use crate::data::certificate::elements::{ConstraintType, Objective, Rtp};
use crate::data::certificate::{Certificate, Constraint, Reason};
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;

/// A certificate is accepted for one of these reasons.
#[derive(Debug, Eq, PartialEq)]
pub enum CheckOutcome {
    /// A falsehood was derived without assumptions; the problem is infeasible.
    InfeasibilityVerified,
    /// The claimed dual bound on the objective was derived without assumptions.
    RangeVerified,
    /// The claimed range has no bound on the dual side, so there is nothing to derive.
    TautologicalBound,
}

/// Verify a certificate.
///
/// # Return value
///
/// Why the certificate is accepted, or the first defect encountered.
pub fn verify(certificate: &Certificate) -> Result<CheckOutcome, Verification> {
    let integrality = certificate.integrality();
    let best_solution_value = check_solutions(certificate, &integrality)?;

    let minimize = certificate.objective.direction == Objective::Minimize;
    if let Rtp::Range { lower, upper } = &certificate.rtp {
        let dual_bound = if minimize { lower } else { upper };
        if dual_bound.is_none() {
            info!("dual bound of the relation to prove is a tautology");
            return Ok(CheckOutcome::TautologicalBound);
        }
    }
    let target = target_constraint(certificate, minimize);

    let number_of_constraints = certificate.constraints.len();
    let number_of_derivations = certificate.derivations.len();
    let mut constraints = certificate.constraints.clone();
    constraints.reserve(number_of_derivations);

    info!("verifying {} derivations", number_of_derivations);

    for (i, derivation) in certificate.derivations.iter().enumerate() {
        let index = number_of_constraints + i;
        let mut to_derive = derivation.constraint.clone();
        let label = to_derive.label().to_string();
        debug!("{} - deriving {}", index, label);

        let assumptions = match &derivation.reason {
            Reason::Assumption => {
                let mut assumptions = BTreeSet::new();
                assumptions.insert(index);
                assumptions
            }
            Reason::Lin(multipliers) | Reason::Rnd(multipliers) => {
                let (mut derived, assumptions) =
                    combine(&mut constraints, multipliers, index, &label)?;

                if matches!(&derivation.reason, Reason::Rnd(_)) {
                    derived
                        .round(&integrality)
                        .map_err(|error| Verification::Rounding { derivation: label.clone(), error })?;
                }

                if !derived.dominates(&to_derive) {
                    return Err(mismatch(&label, &derived, &to_derive));
                }
                assumptions
            }
            Reason::LinIncomplete(_) | Reason::LinWeak { .. } => {
                return Err(Verification::Incomplete { derivation: label });
            }
            Reason::Uns { constraint_1, assumption_1, constraint_2, assumption_2 } => check_unsplit(
                &constraints,
                &to_derive,
                [*constraint_1, *assumption_1, *constraint_2, *assumption_2],
                &integrality,
                &label,
            )?,
            Reason::Sol => {
                check_cutoff(certificate, &to_derive, &best_solution_value, &label)?;
                BTreeSet::new()
            }
        };

        to_derive.set_assumptions(assumptions);
        to_derive.set_max_ref_idx(derivation.max_ref_idx);
        constraints.push(to_derive);

        let newest = &constraints[index];
        if newest.assumptions().is_empty() {
            match (&certificate.rtp, &target) {
                (Rtp::Infeasible, _) if newest.is_falsehood() => {
                    info!("successfully verified infeasibility after {} derivations", i + 1);
                    return Ok(CheckOutcome::InfeasibilityVerified);
                }
                (Rtp::Range { .. }, Some(target))
                    if newest.has_objective_coefficients() && newest.dominates(target) =>
                {
                    info!("successfully verified the optimal value range after {} derivations", i + 1);
                    return Ok(CheckOutcome::RangeVerified);
                }
                _ => {}
            }
        }

        // Nothing later may reference the new constraint when its own bound points at or before
        // itself; the final derivation is never trashed.
        if i + 1 < number_of_derivations
            && derivation.max_ref_idx >= 0
            && (derivation.max_ref_idx as usize) < constraints.len()
        {
            constraints[index].trash();
        }
    }

    Err(final_failure(&constraints, &target, &certificate.rtp))
}

/// Check integrality and feasibility of every claimed solution.
///
/// # Return value
///
/// The best objective value over the solutions, if any, and an error when a solution violates a
/// constraint or the claimed primal bound is not supported.
fn check_solutions(
    certificate: &Certificate,
    integrality: &[bool],
) -> Result<Option<Rational>, Verification> {
    let minimize = certificate.objective.direction == Objective::Minimize;
    let mut best: Option<Rational> = None;

    for solution in &certificate.solutions {
        debug!("checking solution {}", solution.label);

        for (index, value) in solution.assignment.iter() {
            if integrality[*index] && !value.is_integer() {
                return Err(Verification::FractionalSolution {
                    solution: solution.label.clone(),
                    variable: *index,
                });
            }
        }

        for constraint in &certificate.constraints {
            let coefficients = match constraint.coefficients() {
                Some(coefficients) => coefficients,
                None => continue,
            };
            let activity = coefficients.scalar_product(&solution.assignment);
            if !constraint.sense().is_satisfied_by(&activity, constraint.rhs()) {
                return Err(Verification::InfeasibleSolution {
                    solution: solution.label.clone(),
                    constraint: constraint.label().to_string(),
                });
            }
        }

        let value = certificate.objective.coefficients.scalar_product(&solution.assignment);
        debug!("solution {} has objective value {}", solution.label, value);
        best = Some(match best {
            None => value,
            Some(incumbent) => {
                if minimize == (value < incumbent) {
                    value
                } else {
                    incumbent
                }
            }
        });
    }

    if let Rtp::Range { lower, upper } = &certificate.rtp {
        let primal_bound = if minimize { upper } else { lower };
        match (&best, primal_bound) {
            (Some(best), Some(bound)) => {
                let violated = if minimize { best > bound } else { best < bound };
                if violated {
                    return Err(Verification::PrimalBound {
                        best: best.clone(),
                        bound: bound.clone(),
                    });
                }
            }
            (None, Some(_)) => return Err(Verification::NoSolutions),
            _ => {}
        }
    }

    if let Some(value) = &best {
        info!("best objective value over all solutions: {}", value);
    }

    Ok(best)
}

/// The constraint that discharges the dual side of a claimed range, if there is one.
fn target_constraint(certificate: &Certificate, minimize: bool) -> Option<Constraint> {
    match &certificate.rtp {
        Rtp::Infeasible => None,
        Rtp::Range { lower, upper } => {
            let (sense, bound) = if minimize {
                (ConstraintType::Greater, lower)
            } else {
                (ConstraintType::Less, upper)
            };
            bound.as_ref().map(|rhs| {
                Constraint::with_objective_coefficients(
                    "rtp",
                    sense,
                    rhs.clone(),
                    Arc::clone(&certificate.objective.coefficients),
                    false,
                )
            })
        }
    }
}

/// Aggregate a linear combination of earlier constraints.
///
/// Per multiplier: the reference must be in range and not trashed, and the product of multiplier
/// sign and constraint sense must not conflict with the other multipliers. Referenced
/// constraints whose reference bound has been reached are trashed right after use.
///
/// # Return value
///
/// The aggregated constraint and the union of the assumption sets of all constraints referenced
/// with a nonzero multiplier.
fn combine(
    constraints: &mut [Constraint],
    multipliers: &SparseVector,
    index: usize,
    label: &str,
) -> Result<(Constraint, BTreeSet<usize>), Verification> {
    let mut sense = 0i8;
    let mut coefficients = SparseVector::empty();
    let mut rhs = Rational::zero();
    let mut assumptions = BTreeSet::new();

    for (reference, multiplier) in multipliers.iter() {
        if multiplier.is_zero() {
            continue;
        }
        if *reference >= index {
            return Err(Verification::IndexOutOfRange {
                derivation: label.to_string(),
                index: *reference,
                limit: index,
            });
        }

        let (vector, reference_rhs, max_ref_idx) = {
            let constraint = &constraints[*reference];
            let vector = match constraint.coefficients() {
                Some(vector) => Arc::clone(vector),
                None => {
                    return Err(Verification::TrashedReference {
                        derivation: label.to_string(),
                        index: *reference,
                        label: constraint.label().to_string(),
                    });
                }
            };

            let contribution = constraint.sense().sign() * multiplier.signum();
            if sense == 0 {
                sense = contribution;
            } else if contribution != 0 && contribution != sense {
                return Err(Verification::SignConflict {
                    derivation: label.to_string(),
                    index: *reference,
                });
            }

            assumptions.extend(constraint.assumptions().iter().copied());
            (vector, constraint.rhs().clone(), constraint.max_ref_idx())
        };

        coefficients.add_multiple(multiplier, &vector);
        rhs += multiplier * &reference_rhs;

        if max_ref_idx >= 0 && (max_ref_idx as usize) <= index {
            constraints[*reference].trash();
        }
    }

    let sense = match sense {
        0 => ConstraintType::Equal,
        1 => ConstraintType::Greater,
        _ => ConstraintType::Less,
    };

    Ok((Constraint::new("", sense, rhs, coefficients, false), assumptions))
}

/// Validate an unsplit step and compute the resulting assumption set.
///
/// `con1` and `asm1`, `con2` and `asm2` must be inequalities forming an integer disjunction,
/// e.g. `mx <= d` and `mx >= d + 1` such that the variables indexed by the support of `m` are
/// integers.
fn check_unsplit(
    constraints: &[Constraint],
    to_derive: &Constraint,
    [con1, asm1, con2, asm2]: [usize; 4],
    integrality: &[bool],
    label: &str,
) -> Result<BTreeSet<usize>, Verification> {
    for reference in [con1, asm1, con2, asm2] {
        if constraints[reference].is_trashed() {
            return Err(Verification::TrashedReference {
                derivation: label.to_string(),
                index: reference,
                label: constraints[reference].label().to_string(),
            });
        }
    }

    let unsplit_error =
        |error| Verification::Unsplit { derivation: label.to_string(), error };

    for branch in [con1, con2] {
        if !constraints[branch].dominates(to_derive) {
            return Err(unsplit_error(UnsplitError::DoesNotDominate(branch)));
        }
    }

    let first = &constraints[asm1];
    let second = &constraints[asm2];

    if first.sense().sign() * second.sense().sign() != -1 {
        return Err(unsplit_error(UnsplitError::SenseRequirement));
    }

    let one = Rational::one();
    let is_disjunction = if first.sense() == ConstraintType::Less {
        &(first.rhs() + &one) == second.rhs()
    } else {
        first.rhs() == &(second.rhs() + &one)
    };
    if !is_disjunction {
        return Err(unsplit_error(UnsplitError::NotTautology));
    }

    // Both may point at the shared objective vector, hence the identity fast path.
    let (first_vector, second_vector) = match (first.coefficients(), second.coefficients()) {
        (Some(first_vector), Some(second_vector)) => (first_vector, second_vector),
        _ => return Err(unsplit_error(UnsplitError::CoefficientMismatch)),
    };
    let equal = Arc::ptr_eq(first_vector, second_vector)
        || first_vector == second_vector
        || first_vector.semantic_eq(second_vector);
    if !equal {
        return Err(unsplit_error(UnsplitError::CoefficientMismatch));
    }

    for (variable, value) in first_vector.iter() {
        if value.is_zero() {
            continue;
        }
        if !integrality.get(*variable).copied().unwrap_or(false) {
            return Err(unsplit_error(UnsplitError::NonIntegerVariable(*variable)));
        }
        if !value.is_integer() {
            return Err(unsplit_error(UnsplitError::NonIntegerCoefficient(*variable)));
        }
    }

    let mut assumptions = constraints[con1].assumptions().clone();
    assumptions.remove(&asm1);
    let mut from_second = constraints[con2].assumptions().clone();
    from_second.remove(&asm2);
    assumptions.extend(from_second);

    Ok(assumptions)
}

/// Validate a cutoff bound against the best solution.
fn check_cutoff(
    certificate: &Certificate,
    to_derive: &Constraint,
    best: &Option<Rational>,
    label: &str,
) -> Result<(), Verification> {
    let cutoff_error = |error| Verification::Cutoff { derivation: label.to_string(), error };

    if !to_derive.has_objective_coefficients() {
        return Err(cutoff_error(CutoffError::NotObjective));
    }
    if to_derive.sense() != ConstraintType::Less {
        return Err(cutoff_error(CutoffError::WrongSense));
    }

    let best = match best {
        Some(best) => best,
        None => return Err(cutoff_error(CutoffError::NoSolution)),
    };
    let mut threshold = best.clone();
    if certificate.objective.is_integral {
        threshold -= Rational::one();
    }

    if to_derive.rhs() < &threshold {
        return Err(cutoff_error(CutoffError::BelowBest {
            rhs: to_derive.rhs().clone(),
            threshold,
        }));
    }

    Ok(())
}

fn mismatch(label: &str, derived: &Constraint, declared: &Constraint) -> Verification {
    let difference = match derived.difference(declared) {
        Some((vector, rhs)) => {
            Constraint::new("", derived.sense(), rhs, vector, false).to_string()
        }
        None => "<unavailable>".to_string(),
    };

    Verification::Mismatch(Box::new(crate::algorithm::error::Mismatch {
        derivation: label.to_string(),
        declared: declared.to_string(),
        derived: derived.to_string(),
        difference,
    }))
}

fn final_failure(
    constraints: &[Constraint],
    target: &Option<Constraint>,
    rtp: &Rtp,
) -> Verification {
    if let Some(last) = constraints.last() {
        if !last.assumptions().is_empty() {
            return Verification::UndischargedAssumptions {
                assumptions: last
                    .assumptions()
                    .iter()
                    .map(|&index| (index, constraints[index].label().to_string()))
                    .collect(),
            };
        }
    }

    let expected = match (rtp, target) {
        (Rtp::Infeasible, _) => "infeasibility".to_string(),
        (_, Some(target)) => target.to_string(),
        _ => "a dual bound".to_string(),
    };
    let proved = constraints
        .last()
        .map_or("nothing".to_string(), |constraint| constraint.to_string());

    Verification::Unproved { proved, expected }
}

#[cfg(test)]
mod test {
    use crate::algorithm::check::{verify, CheckOutcome};
    use crate::algorithm::error::Verification;
    use crate::io::vipr::parsing::parse;

    fn outcome(text: &str) -> Result<CheckOutcome, Verification> {
        verify(&parse(text).unwrap())
    }

    const INFEASIBLE: &str = "\
VER 1.0
VAR 1
x
INT 1
0
OBJ min 1 0 1
CON 2 0
C1 G 1 1 0 1
C2 L 0 1 0 1
RTP infeas
SOL 0
DER 1
D1 G 1 0 { lin 2 0 1 1 -1 } -1
";

    #[test]
    fn infeasibility() {
        assert_eq!(outcome(INFEASIBLE), Ok(CheckOutcome::InfeasibilityVerified));
    }

    #[test]
    fn sign_conflict() {
        // Adding the two constraints with positive multipliers mixes ≥ and ≤.
        let text = INFEASIBLE.replace("{ lin 2 0 1 1 -1 }", "{ lin 2 0 1 1 1 }");
        assert!(matches!(outcome(&text), Err(Verification::SignConflict { index: 1, .. })));
    }

    #[test]
    fn mismatch_reports_both_sides() {
        // 1·C1 derives x >= 1, which does not dominate the declared falsehood.
        let text = INFEASIBLE.replace("{ lin 2 0 1 1 -1 }", "{ lin 1 0 1 }");
        match outcome(&text) {
            Err(Verification::Mismatch(mismatch)) => {
                assert_eq!(mismatch.derivation, "D1");
                assert!(mismatch.declared.contains(">= 1"));
                assert!(mismatch.derived.contains("x0"));
            }
            other => panic!("expected a mismatch, got {:?}", other),
        }
    }

    const RANGE: &str = "\
VER 1.0
VAR 2
x y
INT 2
0 1
OBJ min 2 0 1 1 1
CON 2 0
C1 G 1 2 0 4 1 1
C2 L 2 2 0 4 1 -1
RTP range 1 1
SOL 2
feas 1 1 2
opt 1 1 1
DER 4
C3 G -1/2 1 1 1 { lin 2 0 1/2 1 -1/2 } 3
C4 G 0 1 1 1 { rnd 1 2 1 } 4
C5 G 1/4 OBJ { lin 2 0 1/4 3 3/4 } 5
C6 G 1 OBJ { rnd 1 4 1 } -1
";

    #[test]
    fn range_with_cutting_planes() {
        assert_eq!(outcome(RANGE), Ok(CheckOutcome::RangeVerified));
    }

    #[test]
    fn zero_multipliers_are_ignored() {
        // An extra zero multiplier on the ≤ constraint C2 must not trip the sign check.
        let text = RANGE.replace("{ lin 2 0 1/4 3 3/4 }", "{ lin 3 0 1/4 1 0 3 3/4 }");
        assert_eq!(outcome(&text), Ok(CheckOutcome::RangeVerified));
    }

    #[test]
    fn tautology_shortcut() {
        let text = RANGE.replace("RTP range 1 1", "RTP range -inf 1");
        assert_eq!(outcome(&text), Ok(CheckOutcome::TautologicalBound));
    }

    #[test]
    fn primal_bound_violation() {
        let text = RANGE.replace("RTP range 1 1", "RTP range 1/2 1/2");
        assert!(matches!(outcome(&text), Err(Verification::PrimalBound { .. })));
    }

    #[test]
    fn missing_solutions_for_primal_bound() {
        let text = RANGE.replace("SOL 2\nfeas 1 1 2\nopt 1 1 1", "SOL 0");
        assert!(matches!(outcome(&text), Err(Verification::NoSolutions)));
    }

    #[test]
    fn solution_violations() {
        let text = RANGE.replace("feas 1 1 2", "feas 2 0 -1 1 2");
        assert!(matches!(
            outcome(&text),
            Err(Verification::InfeasibleSolution { constraint, .. }) if constraint == "C1"
        ));

        let text = RANGE.replace("feas 1 1 2", "feas 2 0 1/2 1 2");
        assert!(matches!(outcome(&text), Err(Verification::FractionalSolution { variable: 0, .. })));
    }

    #[test]
    fn rounding_rejections() {
        // Fractional coefficient: half of C1 has coefficient 2 on x and 1/2 on y.
        let text = RANGE.replace("{ rnd 1 2 1 }", "{ rnd 1 0 1/2 }");
        assert!(matches!(outcome(&text), Err(Verification::Rounding { .. })));
    }

    #[test]
    fn trash_safety() {
        // C3 declares derivation index 2 as its last reference, but C4 at index 3 uses it.
        let text = RANGE.replace("{ lin 2 0 1/2 1 -1/2 } 3", "{ lin 2 0 1/2 1 -1/2 } 2");
        assert!(matches!(
            outcome(&text),
            Err(Verification::TrashedReference { index: 2, .. })
        ));
    }

    #[test]
    fn negative_reference_index_disables_trashing() {
        let text = RANGE
            .replace("{ lin 2 0 1/2 1 -1/2 } 3", "{ lin 2 0 1/2 1 -1/2 } -1")
            .replace("{ rnd 1 2 1 } 4", "{ rnd 1 2 1 } -1");
        assert_eq!(outcome(&text), Ok(CheckOutcome::RangeVerified));
    }

    #[test]
    fn undischarged_assumptions() {
        let text = INFEASIBLE.replace("{ lin 2 0 1 1 -1 }", "{ asm }");
        assert!(matches!(
            outcome(&text),
            Err(Verification::UndischargedAssumptions { assumptions }) if assumptions == vec![(2, "D1".to_string())]
        ));
    }

    #[test]
    fn cutoff_rules() {
        // x + y <= 1 is justified: best solution has value 1, the objective is integral, so
        // anything at least 0 passes; sense must be L and the payload must be OBJ.
        let sol = RANGE.replace("C5 G 1/4 OBJ { lin 2 0 1/4 3 3/4 } 5", "C5 L 1 OBJ { sol } 5");
        let parsed = parse(&sol).unwrap();
        // The run fails later (C6 now lacks its ingredient), but the cutoff itself is accepted.
        assert!(!matches!(verify(&parsed), Err(Verification::Cutoff { .. })));

        let wrong_sense = RANGE.replace("C5 G 1/4 OBJ { lin 2 0 1/4 3 3/4 } 5", "C5 G 1 OBJ { sol } 5");
        assert!(matches!(outcome(&wrong_sense), Err(Verification::Cutoff { .. })));

        let not_objective =
            RANGE.replace("C5 G 1/4 OBJ { lin 2 0 1/4 3 3/4 } 5", "C5 L 1 2 0 1 1 1 { sol } 5");
        assert!(matches!(outcome(&not_objective), Err(Verification::Cutoff { .. })));

        let below_best = RANGE.replace("C5 G 1/4 OBJ { lin 2 0 1/4 3 3/4 } 5", "C5 L -1 OBJ { sol } 5");
        assert!(matches!(outcome(&below_best), Err(Verification::Cutoff { .. })));
    }

    #[test]
    fn cutoff_without_integral_objective_is_not_strengthened() {
        // With x continuous the objective is no longer integral: a cutoff at best - 1 = 0 is no
        // longer justified, the bound may only be the best value itself.
        let relaxed = RANGE.replace("INT 2\n0 1", "INT 1\n1");
        let strengthened =
            relaxed.replace("C5 G 1/4 OBJ { lin 2 0 1/4 3 3/4 } 5", "C5 L 0 OBJ { sol } 5");
        assert!(matches!(outcome(&strengthened), Err(Verification::Cutoff { .. })));

        let at_best =
            relaxed.replace("C5 G 1/4 OBJ { lin 2 0 1/4 3 3/4 } 5", "C5 L 1 OBJ { sol } 5");
        assert!(!matches!(outcome(&at_best), Err(Verification::Cutoff { .. })));
    }

    #[test]
    fn incomplete_derivations_are_rejected_by_the_checker() {
        let text = RANGE.replace("{ lin 2 0 1/4 3 3/4 }", "{ lin incomplete 0 1 2 3 }");
        assert!(matches!(outcome(&text), Err(Verification::Incomplete { .. })));
    }
}
