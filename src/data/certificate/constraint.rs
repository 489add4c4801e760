//! # Constraints
//!
//! The central entity of a certificate. Original problem constraints and derived constraints are
//! represented uniformly; derived constraints additionally track the assumptions they depend on
//! and the index of the last derivation allowed to reference them.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use num_traits::Zero;

use crate::data::certificate::elements::ConstraintType;
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;

/// A single (in)equality over the problem variables.
///
/// The coefficient vector is shared: constraints whose payload is the objective function all
/// reference the same allocation, and trashing a constraint drops its reference.
#[derive(Clone, Debug)]
pub struct Constraint {
    label: String,
    sense: ConstraintType,
    rhs: Rational,
    /// `None` once the constraint has been trashed.
    coefficients: Option<Arc<SparseVector>>,
    is_assumption: bool,
    /// Indices of the assumption constraints this constraint transitively depends on.
    assumptions: BTreeSet<usize>,
    /// Whether the coefficient vector is the shared objective vector.
    coefs_equal_obj: bool,
    falsehood: bool,
    /// Index of the last derivation that may reference this constraint; negative values disable
    /// trashing.
    max_ref_idx: i64,
}

/// Reasons an integer rounding step can be rejected.
#[derive(Debug, Eq, PartialEq)]
pub enum RoundingError {
    /// Rounding is not defined for equality constraints.
    EqualitySense,
    /// A support variable is not an integer variable.
    ContinuousVariable(usize),
    /// The coefficient of this variable is not an integer.
    FractionalCoefficient(usize),
}

impl Constraint {
    /// Create a constraint owning its coefficients.
    ///
    /// The coefficient vector is compactified, so emptiness and falsehood tests afterwards see
    /// semantic content only.
    pub fn new(
        label: impl Into<String>,
        sense: ConstraintType,
        rhs: Rational,
        mut coefficients: SparseVector,
        is_assumption: bool,
    ) -> Self {
        coefficients.compactify();
        Self::with_shared_raw(label.into(), sense, rhs, Arc::new(coefficients), is_assumption, false)
    }

    /// Create a constraint referencing the shared objective vector.
    pub fn with_objective_coefficients(
        label: impl Into<String>,
        sense: ConstraintType,
        rhs: Rational,
        coefficients: Arc<SparseVector>,
        is_assumption: bool,
    ) -> Self {
        Self::with_shared_raw(label.into(), sense, rhs, coefficients, is_assumption, true)
    }

    fn with_shared_raw(
        label: String,
        sense: ConstraintType,
        rhs: Rational,
        coefficients: Arc<SparseVector>,
        is_assumption: bool,
        coefs_equal_obj: bool,
    ) -> Self {
        let falsehood = Self::compute_falsehood(sense, &rhs, &coefficients);
        Self {
            label,
            sense,
            rhs,
            coefficients: Some(coefficients),
            is_assumption,
            assumptions: BTreeSet::new(),
            coefs_equal_obj,
            falsehood,
            max_ref_idx: -1,
        }
    }

    fn compute_falsehood(sense: ConstraintType, rhs: &Rational, coefficients: &SparseVector) -> bool {
        coefficients.is_empty()
            && match sense {
                ConstraintType::Equal => !rhs.is_zero(),
                ConstraintType::Less => rhs.is_negative(),
                ConstraintType::Greater => rhs.is_positive(),
            }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sense(&self) -> ConstraintType {
        self.sense
    }

    pub fn rhs(&self) -> &Rational {
        &self.rhs
    }

    /// The coefficient vector, or `None` if this constraint was trashed.
    pub fn coefficients(&self) -> Option<&Arc<SparseVector>> {
        self.coefficients.as_ref()
    }

    pub fn is_assumption(&self) -> bool {
        self.is_assumption
    }

    pub fn assumptions(&self) -> &BTreeSet<usize> {
        &self.assumptions
    }

    pub fn set_assumptions(&mut self, assumptions: BTreeSet<usize>) {
        self.assumptions = assumptions;
    }

    /// Whether the coefficient vector is the shared objective vector.
    pub fn has_objective_coefficients(&self) -> bool {
        self.coefs_equal_obj
    }

    pub fn max_ref_idx(&self) -> i64 {
        self.max_ref_idx
    }

    pub fn set_max_ref_idx(&mut self, index: i64) {
        self.max_ref_idx = index;
    }

    /// Whether the constraint is a contradiction like `0 >= 1`.
    pub fn is_falsehood(&self) -> bool {
        self.falsehood
    }

    /// Whether the constraint holds trivially, like `0 <= 1`.
    pub fn is_tautology(&self) -> bool {
        match &self.coefficients {
            Some(coefficients) => {
                coefficients.is_empty()
                    && match self.sense {
                        ConstraintType::Equal => self.rhs.is_zero(),
                        ConstraintType::Less => !self.rhs.is_negative(),
                        ConstraintType::Greater => !self.rhs.is_positive(),
                    }
            }
            None => false,
        }
    }

    /// Whether this constraint implies `other`.
    ///
    /// A falsehood dominates anything. Otherwise the two coefficient vectors must agree and the
    /// relation of the right hand sides must be at least as strong in the direction of `other`'s
    /// sense.
    ///
    /// Coefficient vectors are first compared structurally; on failure the comparison is retried
    /// at the semantic level (ignoring explicit zeros and unreduced values), so that vectors
    /// denoting the same linear form always dominate each other even when one of them accumulated
    /// zeros during aggregation.
    pub fn dominates(&self, other: &Constraint) -> bool {
        if self.falsehood {
            return true;
        }

        let (mine, theirs) = match (&self.coefficients, &other.coefficients) {
            (Some(mine), Some(theirs)) => (mine, theirs),
            _ => return false,
        };

        let coefficients_equal =
            Arc::ptr_eq(mine, theirs) || mine == theirs || mine.semantic_eq(theirs);
        if !coefficients_equal {
            return false;
        }

        match other.sense {
            ConstraintType::Greater => self.sense != ConstraintType::Less && self.rhs >= other.rhs,
            ConstraintType::Less => self.sense != ConstraintType::Greater && self.rhs <= other.rhs,
            ConstraintType::Equal => self.sense == ConstraintType::Equal && self.rhs == other.rhs,
        }
    }

    /// Round the right hand side towards the feasible side: down for ≤, up for ≥.
    ///
    /// Only permitted when every variable in the support is an integer variable and every
    /// coefficient is an integer.
    pub fn round(&mut self, integer_variables: &[bool]) -> Result<(), RoundingError> {
        let coefficients = match &self.coefficients {
            Some(coefficients) => coefficients,
            None => return Ok(()),
        };

        for (index, value) in coefficients.iter() {
            if value.is_zero() {
                continue;
            }
            if !integer_variables.get(*index).copied().unwrap_or(false) {
                return Err(RoundingError::ContinuousVariable(*index));
            }
            if !value.is_integer() {
                return Err(RoundingError::FractionalCoefficient(*index));
            }
        }

        match self.sense {
            ConstraintType::Less => self.rhs = self.rhs.floor(),
            ConstraintType::Greater => self.rhs = self.rhs.ceil(),
            ConstraintType::Equal => return Err(RoundingError::EqualitySense),
        }

        Ok(())
    }

    /// Release the coefficient storage.
    ///
    /// Only the label and sense remain meaningful afterwards; the constraint can no longer be
    /// referenced by derivations.
    pub fn trash(&mut self) {
        self.coefficients = None;
        self.falsehood = false;
        self.rhs = Rational::zero();
        self.assumptions.clear();
    }

    pub fn is_trashed(&self) -> bool {
        self.coefficients.is_none()
    }

    /// The coefficient and right hand side differences against another constraint, for
    /// diagnostics.
    pub fn difference(&self, other: &Constraint) -> Option<(SparseVector, Rational)> {
        let mine = self.coefficients.as_ref()?;
        let theirs = other.coefficients.as_ref()?;
        Some((mine.difference(theirs), &self.rhs - &other.rhs))
    }
}

impl fmt::Display for Constraint {
    /// Render with index based variable names, like `2 x0 - x3 >= 1`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.coefficients {
            None => write!(f, "{}: <trashed>", self.label),
            Some(coefficients) => {
                if !self.label.is_empty() {
                    write!(f, "{}: ", self.label)?;
                }
                let mut first = true;
                for (index, value) in coefficients.iter() {
                    if value.is_zero() {
                        continue;
                    }
                    if first {
                        if value.is_negative() {
                            write!(f, "-")?;
                        }
                    } else if value.is_negative() {
                        write!(f, " - ")?;
                    } else {
                        write!(f, " + ")?;
                    }
                    first = false;

                    let magnitude = if value.is_negative() { -value } else { value.clone() };
                    if magnitude == Rational::from_integer(1) {
                        write!(f, "x{}", index)?;
                    } else {
                        write!(f, "{} x{}", magnitude, index)?;
                    }
                }
                if first {
                    write!(f, "0")?;
                }
                write!(f, " {} {}", self.sense, self.rhs)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::data::certificate::constraint::{Constraint, RoundingError};
    use crate::data::certificate::elements::ConstraintType;
    use crate::data::linear_algebra::SparseVector;
    use crate::R;

    fn vector(pairs: &[(usize, i64)]) -> SparseVector {
        SparseVector::new(pairs.iter().map(|&(i, v)| (i, R!(v))).collect())
    }

    fn constraint(sense: ConstraintType, rhs: i64, pairs: &[(usize, i64)]) -> Constraint {
        Constraint::new("c", sense, R!(rhs), vector(pairs), false)
    }

    #[test]
    fn falsehood_and_tautology() {
        assert!(constraint(ConstraintType::Greater, 1, &[]).is_falsehood());
        assert!(constraint(ConstraintType::Less, -1, &[]).is_falsehood());
        assert!(constraint(ConstraintType::Equal, 1, &[]).is_falsehood());
        assert!(!constraint(ConstraintType::Greater, 0, &[]).is_falsehood());
        assert!(constraint(ConstraintType::Greater, 0, &[]).is_tautology());
        assert!(constraint(ConstraintType::Less, 1, &[]).is_tautology());
        assert!(constraint(ConstraintType::Equal, 0, &[]).is_tautology());
        assert!(!constraint(ConstraintType::Greater, 1, &[(0, 1)]).is_falsehood());
        assert!(!constraint(ConstraintType::Greater, 0, &[(0, 1)]).is_tautology());
    }

    #[test]
    fn domination() {
        let stronger = constraint(ConstraintType::Greater, 2, &[(0, 1)]);
        let weaker = constraint(ConstraintType::Greater, 1, &[(0, 1)]);
        assert!(stronger.dominates(&weaker));
        assert!(!weaker.dominates(&stronger));

        let equality = constraint(ConstraintType::Equal, 2, &[(0, 1)]);
        assert!(equality.dominates(&weaker));
        assert!(equality.dominates(&stronger));
        assert!(!stronger.dominates(&equality));

        let falsehood = constraint(ConstraintType::Greater, 1, &[]);
        assert!(falsehood.dominates(&weaker));
        assert!(falsehood.dominates(&equality));

        let other_form = constraint(ConstraintType::Greater, 2, &[(1, 1)]);
        assert!(!stronger.dominates(&other_form));
    }

    #[test]
    fn domination_retries_semantically() {
        // `derived` carries an explicit zero left behind by aggregation.
        let mut aggregated = vector(&[(0, 1), (1, 2)]);
        aggregated.add_multiple(&R!(-2), &vector(&[(1, 1)]));
        let derived = Constraint::new("", ConstraintType::Greater, R!(1), aggregated, false);
        let declared = constraint(ConstraintType::Greater, 1, &[(0, 1)]);

        assert!(derived.dominates(&declared));
        assert!(declared.dominates(&derived));
    }

    #[test]
    fn dominance_antisymmetry_implies_same_sense() {
        let le = constraint(ConstraintType::Less, 1, &[(0, 1)]);
        let ge = constraint(ConstraintType::Greater, 1, &[(0, 1)]);
        let eq = constraint(ConstraintType::Equal, 1, &[(0, 1)]);

        // Mutual domination only happens for identical senses (or falsehoods).
        assert!(!(le.dominates(&ge) && ge.dominates(&le)));
        assert!(!(eq.dominates(&le) && le.dominates(&eq)));
        assert!(le.dominates(&le.clone()));
    }

    #[test]
    fn rounding() {
        let integrality = [true, false];

        let mut toround = constraint(ConstraintType::Greater, 0, &[(0, 2)]);
        toround.rhs = R!(1, 2);
        assert_eq!(toround.round(&integrality), Ok(()));
        assert_eq!(toround.rhs(), &R!(1));

        let mut toround = constraint(ConstraintType::Less, 0, &[(0, 2)]);
        toround.rhs = R!(5, 2);
        assert_eq!(toround.round(&integrality), Ok(()));
        assert_eq!(toround.rhs(), &R!(2));

        let mut continuous = constraint(ConstraintType::Greater, 1, &[(1, 1)]);
        assert_eq!(continuous.round(&integrality), Err(RoundingError::ContinuousVariable(1)));

        let mut fractional = Constraint::new(
            "c",
            ConstraintType::Greater,
            R!(1),
            SparseVector::new(vec![(0, R!(1, 2))]),
            false,
        );
        assert_eq!(fractional.round(&integrality), Err(RoundingError::FractionalCoefficient(0)));

        let mut equality = constraint(ConstraintType::Equal, 1, &[(0, 1)]);
        assert_eq!(equality.round(&integrality), Err(RoundingError::EqualitySense));
    }

    #[test]
    fn trashing() {
        let mut totrash = constraint(ConstraintType::Greater, 1, &[(0, 1)]);
        assert!(!totrash.is_trashed());
        totrash.trash();
        assert!(totrash.is_trashed());
        assert!(!totrash.is_falsehood());
        assert_eq!(totrash.coefficients(), None);
        assert_eq!(totrash.label(), "c");
    }

    #[test]
    fn shared_objective_identity() {
        let objective = Arc::new(vector(&[(0, 1), (1, 1)]));
        let first = Constraint::with_objective_coefficients(
            "a",
            ConstraintType::Greater,
            R!(1),
            Arc::clone(&objective),
            false,
        );
        let second = Constraint::with_objective_coefficients(
            "b",
            ConstraintType::Greater,
            R!(2),
            Arc::clone(&objective),
            false,
        );

        assert!(first.has_objective_coefficients());
        assert!(second.dominates(&first));
        assert!(Arc::ptr_eq(first.coefficients().unwrap(), second.coefficients().unwrap()));
    }
}
