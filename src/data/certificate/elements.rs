//! # Building blocks to describe certificates.
use std::fmt;
use std::ops::Not;

use crate::data::number_types::Rational;

/// A `Constraint` is a type of (in)equality.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConstraintType {
    Equal,
    Greater,
    Less,
}

impl ConstraintType {
    /// The sense as an integer: `-1` for ≤, `0` for =, `1` for ≥.
    pub fn sign(self) -> i8 {
        match self {
            Self::Equal => 0,
            Self::Greater => 1,
            Self::Less => -1,
        }
    }

    /// Whether a left hand side value satisfies the relation against a right hand side.
    pub fn is_satisfied_by(self, lhs: &Rational, rhs: &Rational) -> bool {
        match self {
            Self::Equal => lhs == rhs,
            Self::Greater => lhs >= rhs,
            Self::Less => lhs <= rhs,
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Equal => "=",
            Self::Greater => ">=",
            Self::Less => "<=",
        })
    }
}

/// Direction of a bound.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoundDirection {
    Lower,
    Upper,
}

impl Not for BoundDirection {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }
}

/// Direction of optimization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Objective {
    Maximize,
    Minimize,
}

impl Default for Objective {
    fn default() -> Self {
        Objective::Minimize
    }
}

/// The relation a certificate claims to prove.
///
/// Either the problem is infeasible, or its optimal value lies in a range. An absent bound is
/// unbounded in that direction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rtp {
    Infeasible,
    Range {
        lower: Option<Rational>,
        upper: Option<Rational>,
    },
}

#[cfg(test)]
mod test {
    use crate::data::certificate::elements::{BoundDirection, ConstraintType};
    use crate::R;

    #[test]
    fn satisfaction() {
        assert!(ConstraintType::Greater.is_satisfied_by(&R!(2), &R!(1)));
        assert!(ConstraintType::Greater.is_satisfied_by(&R!(1), &R!(1)));
        assert!(!ConstraintType::Greater.is_satisfied_by(&R!(0), &R!(1)));
        assert!(ConstraintType::Less.is_satisfied_by(&R!(0), &R!(1)));
        assert!(!ConstraintType::Equal.is_satisfied_by(&R!(0), &R!(1)));
        assert!(ConstraintType::Equal.is_satisfied_by(&R!(1), &R!(1)));
    }

    #[test]
    fn bound_direction_negation() {
        assert_eq!(!BoundDirection::Lower, BoundDirection::Upper);
        assert_eq!(!BoundDirection::Upper, BoundDirection::Lower);
    }
}
