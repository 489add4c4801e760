//! # Global variable bounds
//!
//! Constraints with a single nonzero coefficient are variable bounds in disguise. The completion
//! engine keeps, per variable, the strongest such bound seen in the `CON` section: weak
//! derivations consult this table whenever their payload does not name a specific bound to
//! correct with.
use num_traits::Zero;

use crate::data::certificate::elements::{BoundDirection, ConstraintType};
use crate::data::certificate::Certificate;
use crate::data::number_types::Rational;

/// One remembered bound: the normalized bound value, the coefficient the bound row used (the
/// multiplier that reproduces it), and the certificate index of the bound row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundEntry {
    pub value: Rational,
    pub multiplier: Rational,
    pub constraint: usize,
}

/// The strongest known global bound per variable and direction. `None` is unbounded.
#[derive(Debug)]
pub struct GlobalBounds {
    lower: Vec<Option<BoundEntry>>,
    upper: Vec<Option<BoundEntry>>,
}

impl GlobalBounds {
    /// Scan the original constraints for bound rows.
    ///
    /// A row `c · x_j {sense} b` normalizes to `x_j {direction} b / c`, with the direction
    /// flipping when `c` is negative. Equality rows bound in both directions. A later row only
    /// replaces an earlier one when it is strictly stronger.
    pub fn build(certificate: &Certificate) -> Self {
        let variables = certificate.variables.len();
        let mut bounds =
            Self { lower: vec![None; variables], upper: vec![None; variables] };

        for (index, constraint) in certificate.constraints.iter().enumerate() {
            let coefficients = match constraint.coefficients() {
                Some(coefficients) => coefficients,
                None => continue,
            };
            if coefficients.size() != 1 {
                continue;
            }
            let (variable, coefficient) = match coefficients.iter().next() {
                Some((variable, coefficient)) if !coefficient.is_zero() => (*variable, coefficient),
                _ => continue,
            };

            let normalized = constraint.rhs() / coefficient;
            let entry = BoundEntry {
                value: normalized,
                multiplier: coefficient.clone(),
                constraint: index,
            };

            match (constraint.sense(), coefficient.is_positive()) {
                (ConstraintType::Equal, _) => {
                    bounds.improve(BoundDirection::Lower, variable, entry.clone());
                    bounds.improve(BoundDirection::Upper, variable, entry);
                }
                (ConstraintType::Less, true) | (ConstraintType::Greater, false) => {
                    bounds.improve(BoundDirection::Upper, variable, entry);
                }
                (ConstraintType::Less, false) | (ConstraintType::Greater, true) => {
                    bounds.improve(BoundDirection::Lower, variable, entry);
                }
            }
        }

        bounds
    }

    fn improve(&mut self, direction: BoundDirection, variable: usize, entry: BoundEntry) {
        let slot = match direction {
            BoundDirection::Lower => &mut self.lower[variable],
            BoundDirection::Upper => &mut self.upper[variable],
        };
        let stronger = match slot {
            None => true,
            Some(current) => match direction {
                BoundDirection::Lower => current.value < entry.value,
                BoundDirection::Upper => current.value > entry.value,
            },
        };
        if stronger {
            *slot = Some(entry);
        }
    }

    pub fn get(&self, direction: BoundDirection, variable: usize) -> Option<&BoundEntry> {
        match direction {
            BoundDirection::Lower => self.lower[variable].as_ref(),
            BoundDirection::Upper => self.upper[variable].as_ref(),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::complete::bounds::{BoundEntry, GlobalBounds};
    use crate::data::certificate::elements::BoundDirection;
    use crate::io::vipr::parsing::parse;
    use crate::R;

    const CERTIFICATE: &str = "\
VER 1.0
VAR 2
x y
INT 0
OBJ min 1 0 1
CON 5 4
B1 G 0 1 0 1
B2 L 5 1 0 1
B3 L -2 1 0 -2
B4 E 3 1 1 1
R1 G 1 2 0 1 1 1
RTP range -inf inf
SOL 0
DER 0
";

    #[test]
    fn normalization_and_improvement() {
        let certificate = parse(CERTIFICATE).unwrap();
        let bounds = GlobalBounds::build(&certificate);

        // B3 normalizes to x >= 1 and beats B1's x >= 0.
        assert_eq!(
            bounds.get(BoundDirection::Lower, 0),
            Some(&BoundEntry { value: R!(1), multiplier: R!(-2), constraint: 2 }),
        );
        assert_eq!(
            bounds.get(BoundDirection::Upper, 0),
            Some(&BoundEntry { value: R!(5), multiplier: R!(1), constraint: 1 }),
        );
        // The equality bounds y in both directions; the wide row R1 is ignored.
        assert_eq!(
            bounds.get(BoundDirection::Lower, 1),
            Some(&BoundEntry { value: R!(3), multiplier: R!(1), constraint: 3 }),
        );
        assert_eq!(
            bounds.get(BoundDirection::Upper, 1),
            Some(&BoundEntry { value: R!(3), multiplier: R!(1), constraint: 3 }),
        );
    }
}
