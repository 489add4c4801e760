//! # Verification errors
//!
//! Everything that can be wrong about a certificate beyond its syntax. The checker stops at the
//! first of these; the completion engine treats them as fatal as well, with the exception of a
//! non-terminal oracle status (which downgrades to a warning and leaves the derivation
//! incomplete).
use core::fmt::Display;
use std::error::Error;
use std::fmt;

use crate::data::certificate::constraint::RoundingError;
use crate::data::number_types::Rational;

/// A semantic defect in a certificate.
///
/// Each variant carries the derivation label and the offending quantities, so that a failure
/// identifies the exact step and both sides of the disagreement.
#[derive(Debug, Eq, PartialEq)]
pub enum Verification {
    /// A derivation references a constraint at or past its own position.
    IndexOutOfRange { derivation: String, index: usize, limit: usize },
    /// A derivation references a constraint whose storage was already released.
    TrashedReference { derivation: String, index: usize, label: String },
    /// The multipliers of a linear combination mix senses.
    SignConflict { derivation: String, index: usize },
    /// An integer rounding step was applied where it is not permitted.
    Rounding { derivation: String, error: RoundingError },
    /// An unsplit step failed one of its side conditions.
    Unsplit { derivation: String, error: UnsplitError },
    /// The constraint reconstructed from the reason does not dominate the declared one.
    Mismatch(Box<Mismatch>),
    /// A claimed solution assigns a fractional value to an integer variable.
    FractionalSolution { solution: String, variable: usize },
    /// A claimed solution violates an original constraint.
    InfeasibleSolution { solution: String, constraint: String },
    /// The best claimed solution value lies outside the claimed primal bound.
    PrimalBound { best: Rational, bound: Rational },
    /// The claimed range needs a primal bound, but no solutions are given.
    NoSolutions,
    /// A cutoff derivation that is not justified by the best solution.
    Cutoff { derivation: String, error: CutoffError },
    /// A derivation with missing multipliers was met outside the completion engine.
    Incomplete { derivation: String },
    /// Completion of a weak derivation failed.
    WeakCompletion { derivation: String, error: WeakError },
    /// An incomplete derivation was met while the LP oracle is disabled.
    OracleDisabled { derivation: String },
    /// The derivation list ended with assumptions still undischarged.
    UndischargedAssumptions { assumptions: Vec<(usize, String)> },
    /// The derivation list ended without proving the required relation.
    Unproved { proved: String, expected: String },
}

/// Details of a failed domination check: what was declared, what could actually be derived, and
/// their difference.
#[derive(Debug, Eq, PartialEq)]
pub struct Mismatch {
    pub derivation: String,
    pub declared: String,
    pub derived: String,
    pub difference: String,
}

/// Side conditions of the unsplit rule.
#[derive(Debug, Eq, PartialEq)]
pub enum UnsplitError {
    /// One of the two branch constraints does not dominate the derived constraint.
    DoesNotDominate(usize),
    /// The branch assumptions do not have opposite inequality senses.
    SenseRequirement,
    /// The branch assumption right hand sides do not form an integer disjunction.
    NotTautology,
    /// The branch assumptions differ in their coefficient vectors.
    CoefficientMismatch,
    /// A variable in the disjunction support is not an integer variable.
    NonIntegerVariable(usize),
    /// A coefficient in the disjunction support is not an integer.
    NonIntegerCoefficient(usize),
}

/// Side conditions of the cutoff rule.
#[derive(Debug, Eq, PartialEq)]
pub enum CutoffError {
    /// The derived constraint does not carry the objective coefficient vector.
    NotObjective,
    /// Cutoff bounds must have sense ≤.
    WrongSense,
    /// There is no solution to justify a cutoff with.
    NoSolution,
    /// The claimed bound cuts off the best solution.
    BelowBest { rhs: Rational, threshold: Rational },
}

/// Failure modes of weak completion.
#[derive(Debug, Eq, PartialEq)]
pub enum WeakError {
    /// Equality constraints cannot be completed by bound corrections.
    EqualitySense,
    /// A correction is needed for a variable with no usable bound.
    MissingBound { variable: usize, lower: bool },
    /// The corrected right hand side ended up on the wrong side of the declared one.
    DoesNotDominate { corrected: Rational, declared: Rational },
    /// An empty derived constraint claims infeasibility its corrected side does not support.
    InvalidInfeasibility { corrected: Rational },
}

impl Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verification::IndexOutOfRange { derivation, index, limit } => write!(
                f,
                "{}: constraint index {} out of range, only {} constraints precede",
                derivation, index, limit,
            ),
            Verification::TrashedReference { derivation, index, label } => write!(
                f,
                "{}: accessing trashed constraint {} (\"{}\")",
                derivation, index, label,
            ),
            Verification::SignConflict { derivation, index } => write!(
                f,
                "{}: multiplier has wrong sign for constraint index {}",
                derivation, index,
            ),
            Verification::Rounding { derivation, error } => {
                write!(f, "{}: ", derivation)?;
                match error {
                    RoundingError::EqualitySense => {
                        write!(f, "rounding is not defined for equality constraints")
                    }
                    RoundingError::ContinuousVariable(index) => write!(
                        f,
                        "rounding over continuous variable with index {}",
                        index,
                    ),
                    RoundingError::FractionalCoefficient(index) => write!(
                        f,
                        "coefficient of integer variable with index {} is not an integer",
                        index,
                    ),
                }
            }
            Verification::Unsplit { derivation, error } => {
                write!(f, "{}: unsplit failed: ", derivation)?;
                match error {
                    UnsplitError::DoesNotDominate(index) => write!(
                        f,
                        "constraint {} does not dominate the derived constraint",
                        index,
                    ),
                    UnsplitError::SenseRequirement => {
                        write!(f, "branch assumptions must have opposite senses")
                    }
                    UnsplitError::NotTautology => {
                        write!(f, "branch assumptions do not form a tautology")
                    }
                    UnsplitError::CoefficientMismatch => {
                        write!(f, "coefficients of the branch assumptions differ")
                    }
                    UnsplitError::NonIntegerVariable(index) => {
                        write!(f, "noninteger variable with index {}", index)
                    }
                    UnsplitError::NonIntegerCoefficient(index) => {
                        write!(f, "noninteger coefficient for variable index {}", index)
                    }
                }
            }
            Verification::Mismatch(mismatch) => write!(
                f,
                "failed to derive constraint {}\n\tdeclared: {}\n\tderived instead: {}\n\tdifference: {}",
                mismatch.derivation, mismatch.declared, mismatch.derived, mismatch.difference,
            ),
            Verification::FractionalSolution { solution, variable } => write!(
                f,
                "solution \"{}\" has a noninteger value for integer variable with index {}",
                solution, variable,
            ),
            Verification::InfeasibleSolution { solution, constraint } => write!(
                f,
                "solution \"{}\" does not satisfy constraint \"{}\"",
                solution, constraint,
            ),
            Verification::PrimalBound { best, bound } => write!(
                f,
                "best objective value {} exceeds the claimed bound {}",
                best, bound,
            ),
            Verification::NoSolutions => {
                write!(f, "no solutions are given to prove the claimed primal bound")
            }
            Verification::Cutoff { derivation, error } => {
                write!(f, "{}: ", derivation)?;
                match error {
                    CutoffError::NotObjective => {
                        write!(f, "a cutoff bound can only be applied to the objective value")
                    }
                    CutoffError::WrongSense => write!(f, "a cutoff bound should have sense 'L'"),
                    CutoffError::NoSolution => {
                        write!(f, "no solution is known to justify a cutoff bound")
                    }
                    CutoffError::BelowBest { rhs, threshold } => write!(
                        f,
                        "no solution with objective value at most {}, best justifies {}",
                        rhs, threshold,
                    ),
                }
            }
            Verification::Incomplete { derivation } => write!(
                f,
                "{}: derivation is not fully specified, complete the certificate first",
                derivation,
            ),
            Verification::WeakCompletion { derivation, error } => {
                write!(f, "{}: ", derivation)?;
                match error {
                    WeakError::EqualitySense => {
                        write!(f, "cannot complete weakly dominated equality constraints")
                    }
                    WeakError::MissingBound { variable, lower } => write!(
                        f,
                        "no usable {} bound for variable with index {}",
                        if *lower { "lower" } else { "upper" },
                        variable,
                    ),
                    WeakError::DoesNotDominate { corrected, declared } => write!(
                        f,
                        "corrected constraint does not dominate the declared one: corrected side \
                         is {}, declared is {}",
                        corrected, declared,
                    ),
                    WeakError::InvalidInfeasibility { corrected } => write!(
                        f,
                        "invalid claim of infeasibility with corrected side {}",
                        corrected,
                    ),
                }
            }
            Verification::OracleDisabled { derivation } => write!(
                f,
                "{}: the LP oracle must be enabled to process incomplete derivations",
                derivation,
            ),
            Verification::UndischargedAssumptions { assumptions } => {
                writeln!(f, "final derived constraint contains undischarged assumptions:")?;
                for (index, label) in assumptions {
                    writeln!(f, "\t{}: {}", index, label)?;
                }
                Ok(())
            }
            Verification::Unproved { proved, expected } => write!(
                f,
                "failed to verify the relation to prove\n\tproved: {}\n\tinstead of: {}",
                proved, expected,
            ),
        }
    }
}

impl Error for Verification {}
