//! # Writing certificates
//!
//! The inverse of parsing: a `Certificate` is emitted section by section. Token spacing is
//! canonical (single spaces), the line ending style of the input is preserved when known, and
//! nothing else about the input layout is remembered.
use std::io::{self, Write};

use itertools::Itertools;

use crate::data::certificate::elements::{BoundDirection, ConstraintType, Objective, Rtp};
use crate::data::certificate::{Certificate, Constraint, Reason};
use crate::data::linear_algebra::SparseVector;

/// Which end of line marker a file uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineEnding {
    Lf,
    Crlf,
}

impl LineEnding {
    /// Detect the style of a file from its first line break; files without one get `Lf`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(position) if text[..position].ends_with('\r') => Self::Crlf,
            _ => Self::Lf,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

/// Write a certificate.
///
/// Completed derivations are emitted with their reconstructed multiplier list; apart from that
/// the output is the parsed input, token for token.
pub fn write<W: Write>(
    certificate: &Certificate,
    line_ending: LineEnding,
    out: &mut W,
) -> io::Result<()> {
    let eol = line_ending.as_str();

    write!(out, "VER {}.{}{}", certificate.version.0, certificate.version.1, eol)?;

    write!(out, "VAR {}{}", certificate.variables.len(), eol)?;
    for variable in &certificate.variables {
        write!(out, "{}{}", variable.name, eol)?;
    }

    let integers = certificate
        .variables
        .iter()
        .enumerate()
        .filter(|(_, variable)| variable.is_integer)
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    write!(out, "INT {}{}", integers.len(), eol)?;
    if !integers.is_empty() {
        write!(out, "{}{}", integers.iter().join(" "), eol)?;
    }

    let direction = match certificate.objective.direction {
        Objective::Minimize => "min",
        Objective::Maximize => "max",
    };
    write!(out, "OBJ {}{}", direction, eol)?;
    write!(out, "{}{}", format_entries(&certificate.objective.coefficients), eol)?;

    write!(out, "CON {} {}{}", certificate.constraints.len(), certificate.bound_count, eol)?;
    for constraint in &certificate.constraints {
        write!(out, "{}{}", format_constraint(constraint), eol)?;
    }

    match &certificate.rtp {
        Rtp::Infeasible => write!(out, "RTP infeas{}", eol)?,
        Rtp::Range { lower, upper } => {
            let lower = lower.as_ref().map_or("-inf".to_string(), |bound| bound.to_string());
            let upper = upper.as_ref().map_or("inf".to_string(), |bound| bound.to_string());
            write!(out, "RTP range {} {}{}", lower, upper, eol)?;
        }
    }

    write!(out, "SOL {}{}", certificate.solutions.len(), eol)?;
    for solution in &certificate.solutions {
        write!(out, "{} {}{}", solution.label, format_entries(&solution.assignment), eol)?;
    }

    write!(out, "DER {}{}", certificate.derivations.len(), eol)?;
    for derivation in &certificate.derivations {
        write!(
            out,
            "{} {} {}{}",
            format_constraint(&derivation.constraint),
            format_reason(&derivation.reason),
            derivation.max_ref_idx,
            eol,
        )?;
    }

    Ok(())
}

fn format_constraint(constraint: &Constraint) -> String {
    let sense = match constraint.sense() {
        ConstraintType::Equal => "E",
        ConstraintType::Less => "L",
        ConstraintType::Greater => "G",
    };
    let coefficients = match constraint.coefficients() {
        Some(_) if constraint.has_objective_coefficients() => "OBJ".to_string(),
        Some(coefficients) => format_entries(coefficients),
        // Trashing only happens inside the checker, which never writes.
        None => unreachable!("a trashed constraint cannot be written"),
    };

    format!("{} {} {} {}", constraint.label(), sense, constraint.rhs(), coefficients)
}

/// Render a sparse vector as `k index value …` pairs, stored zeros included.
fn format_entries(vector: &SparseVector) -> String {
    let mut formatted = vector.size().to_string();
    for (index, value) in vector.iter() {
        formatted.push_str(&format!(" {} {}", index, value));
    }
    formatted
}

fn format_reason(reason: &Reason) -> String {
    match reason {
        Reason::Assumption => "{ asm }".to_string(),
        Reason::Sol => "{ sol }".to_string(),
        Reason::Lin(multipliers) => format!("{{ lin {} }}", format_entries(multipliers)),
        Reason::Rnd(multipliers) => format!("{{ rnd {} }}", format_entries(multipliers)),
        Reason::LinIncomplete(active) => {
            format!("{{ lin incomplete {} }}", active.iter().join(" "))
        }
        Reason::LinWeak { bounds, multipliers } => {
            let mut inner = bounds.len().to_string();
            for bound in bounds {
                let direction = match bound.direction {
                    BoundDirection::Lower => "L",
                    BoundDirection::Upper => "U",
                };
                inner.push_str(&format!(
                    " {} {} {} {}",
                    direction, bound.variable, bound.constraint, bound.value,
                ));
            }
            format!("{{ lin weak {{ {} }} {} }}", inner, format_entries(multipliers))
        }
        Reason::Uns { constraint_1, assumption_1, constraint_2, assumption_2 } => {
            format!("{{ uns {} {} {} {} }}", constraint_1, assumption_1, constraint_2, assumption_2)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::io::vipr::parsing::parse;
    use crate::io::vipr::writing::{write, LineEnding};

    const CERTIFICATE: &str = "\
VER 1.0
VAR 2
x
y
INT 2
0 1
OBJ min
2 0 1 1 1
CON 2 0
C1 G 1 2 0 4 1 1
C2 L 2 2 0 4 1 -1
RTP range 1 1
SOL 1
opt 1 1 1
DER 2
C3 G -1/2 1 1 1 { lin 2 0 1/2 1 -1/2 } 3
C4 G 1 OBJ { rnd 1 2 1 } -1
";

    fn written(text: &str, line_ending: LineEnding) -> String {
        let certificate = parse(text).unwrap();
        let mut buffer = Vec::new();
        write(&certificate, line_ending, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn round_trip_is_identity_on_canonical_spacing() {
        assert_eq!(written(CERTIFICATE, LineEnding::Lf), CERTIFICATE);
    }

    #[test]
    fn round_trip_modulo_whitespace() {
        let with_extra_whitespace = CERTIFICATE.replace("C2 L", "\nC2   L").replace(' ', "  ");
        assert_eq!(written(&with_extra_whitespace, LineEnding::Lf), CERTIFICATE);
    }

    #[test]
    fn line_ending_detection_and_output() {
        let crlf = CERTIFICATE.replace('\n', "\r\n");
        assert_eq!(LineEnding::detect(&crlf), LineEnding::Crlf);
        assert_eq!(LineEnding::detect(CERTIFICATE), LineEnding::Lf);
        assert_eq!(written(&crlf, LineEnding::Crlf), crlf);
    }

    #[test]
    fn comments_are_not_reproduced() {
        let with_comments = CERTIFICATE.replace("CON 2 0", "% header\nCON 2 0 % trailing");
        assert_eq!(written(&with_comments, LineEnding::Lf), CERTIFICATE);
    }
}
