//! # Parsing certificate files
//!
//! A single linear pass over the token stream, producing model entities in document order. The
//! parser checks syntax, the version gate and index ranges; whether the derivations are *sound*
//! is decided by the checker.
use std::str::FromStr;
use std::sync::Arc;

use crate::data::certificate::elements::{BoundDirection, ConstraintType, Objective, Rtp};
use crate::data::certificate::{
    Certificate, Constraint, Derivation, ObjectiveFunction, Reason, Solution, Variable, WeakBound,
};
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;
use crate::io::error::Parse;
use crate::io::vipr::token::Scanner;
use crate::io::vipr::{VERSION_MAJOR, VERSION_MINOR};

/// Convert certificate text to structured data.
///
/// # Arguments
///
/// * `text` - The certificate file contents.
///
/// # Return value
///
/// A `Certificate`, or the first `Parse` error encountered.
pub fn parse(text: &str) -> Result<Certificate, Parse> {
    let mut scanner = Scanner::new(text);

    expect_section(&mut scanner, "VER")?;
    let version = parse_version(&mut scanner)?;

    expect_section(&mut scanner, "VAR")?;
    let number_of_variables = scanner.next_usize("the number of variables")?;
    let mut variables = Vec::with_capacity(number_of_variables);
    for _ in 0..number_of_variables {
        let (name, _) = scanner.next_word("a variable name")?;
        variables.push(Variable { name: name.to_string(), is_integer: false });
    }

    expect_section(&mut scanner, "INT")?;
    let number_of_integers = scanner.next_usize("the number of integer variables")?;
    for _ in 0..number_of_integers {
        let index = scanner.next_usize("an integer variable index")?;
        if index >= number_of_variables {
            return Err(Parse::new(format!(
                "integer variable index {} out of range, {} variables are declared",
                index, number_of_variables,
            )));
        }
        variables[index].is_integer = true;
    }

    expect_section(&mut scanner, "OBJ")?;
    let objective = parse_objective(&mut scanner, &variables)?;

    expect_section(&mut scanner, "CON")?;
    let number_of_constraints = scanner.next_usize("the number of constraints")?;
    let bound_count = scanner.next_usize("the number of bound constraints")?;
    let mut constraints = Vec::with_capacity(number_of_constraints);
    for _ in 0..number_of_constraints {
        constraints.push(parse_constraint(
            &mut scanner,
            number_of_variables,
            Some(&objective.coefficients),
            false,
        )?);
    }

    expect_section(&mut scanner, "RTP")?;
    let rtp = parse_rtp(&mut scanner)?;

    expect_section(&mut scanner, "SOL")?;
    let number_of_solutions = scanner.next_usize("the number of solutions")?;
    let mut solutions = Vec::with_capacity(number_of_solutions);
    for _ in 0..number_of_solutions {
        let (label, _) = scanner.next_word("a solution label")?;
        let label = label.to_string();
        let mut assignment = match parse_vector_payload(
            &mut scanner,
            number_of_variables,
            Some(&objective.coefficients),
            "a solution",
        )? {
            VectorPayload::Objective(shared) => (*shared).clone(),
            VectorPayload::Own(vector) => vector,
        };
        assignment.compactify();
        solutions.push(Solution { label, assignment });
    }

    expect_section(&mut scanner, "DER")?;
    let number_of_derivations = scanner.next_usize("the number of derivations")?;
    let mut derivations = Vec::with_capacity(number_of_derivations);
    for i in 0..number_of_derivations {
        // Derivations may only reference constraints strictly before their own index.
        let limit = number_of_constraints + i;
        derivations.push(parse_derivation(
            &mut scanner,
            number_of_variables,
            &objective.coefficients,
            limit,
        )?);
    }

    Ok(Certificate {
        version,
        variables,
        objective,
        constraints,
        bound_count,
        rtp,
        solutions,
        derivations,
    })
}

fn expect_section(scanner: &mut Scanner, name: &'static str) -> Result<(), Parse> {
    let (token, line) = scanner.next_word(name)?;
    if token == name {
        Ok(())
    } else {
        Err(Parse::with_location(
            format!("{} expected, read \"{}\" instead", name, token),
            (line, token),
        ))
    }
}

/// Version gating: backward compatibility is kept within a major version.
fn parse_version(scanner: &mut Scanner) -> Result<(u32, u32), Parse> {
    let (token, line) = scanner.next_word("a version number")?;
    let malformed = || {
        Parse::with_location(format!("malformed version number \"{}\"", token), (line, token))
    };

    let (major, minor) = token.split_once('.').ok_or_else(malformed)?;
    let major = u32::from_str(major).map_err(|_| malformed())?;
    let minor = u32::from_str(minor).map_err(|_| malformed())?;

    if major != VERSION_MAJOR || minor > VERSION_MINOR {
        return Err(Parse::with_location(
            format!(
                "unsupported version {}.{}, supported are versions {}.0 through {}.{}",
                major, minor, VERSION_MAJOR, VERSION_MAJOR, VERSION_MINOR,
            ),
            (line, token),
        ));
    }

    Ok((major, minor))
}

fn parse_objective(scanner: &mut Scanner, variables: &[Variable]) -> Result<ObjectiveFunction, Parse> {
    let (sense, line) = scanner.next_word("an objective sense")?;
    let direction = match sense {
        "min" => Objective::Minimize,
        "max" => Objective::Maximize,
        other => {
            return Err(Parse::with_location(
                format!("invalid objective sense \"{}\"", other),
                (line, other),
            ));
        }
    };

    let mut coefficients =
        match parse_vector_payload(scanner, variables.len(), None, "the objective coefficients")? {
            VectorPayload::Own(vector) => vector,
            VectorPayload::Objective(_) => unreachable!(),
        };
    coefficients.compactify();

    let is_integral = coefficients
        .iter()
        .all(|(index, value)| variables[*index].is_integer && value.is_integer());

    Ok(ObjectiveFunction { direction, coefficients: Arc::new(coefficients), is_integral })
}

fn parse_rtp(scanner: &mut Scanner) -> Result<Rtp, Parse> {
    let (kind, line) = scanner.next_word("a relation to prove")?;
    match kind {
        "infeas" => Ok(Rtp::Infeasible),
        "range" => {
            let lower = parse_bound(scanner, "-inf", "the lower bound")?;
            let upper = parse_bound(scanner, "inf", "the upper bound")?;

            if let (Some(lower), Some(upper)) = (&lower, &upper) {
                if lower > upper {
                    return Err(Parse::new(format!(
                        "invalid bounds to prove: lower {} exceeds upper {}",
                        lower, upper,
                    )));
                }
            }

            Ok(Rtp::Range { lower, upper })
        }
        other => Err(Parse::with_location(
            format!("unrecognized verification type \"{}\"", other),
            (line, other),
        )),
    }
}

fn parse_bound(
    scanner: &mut Scanner,
    infinity: &str,
    expected: &str,
) -> Result<Option<Rational>, Parse> {
    let (token, line) = scanner.next_word(expected)?;
    if token == infinity {
        Ok(None)
    } else {
        Rational::from_str(token).map(Some).map_err(|_| {
            Parse::with_location(
                format!("expected {} or a rational number for {}, read \"{}\"", infinity, expected, token),
                (line, token),
            )
        })
    }
}

/// A sparse vector literal: either explicit `k index value …` pairs or the token `OBJ`
/// referencing the single shared objective vector.
enum VectorPayload {
    Objective(Arc<SparseVector>),
    Own(SparseVector),
}

fn parse_vector_payload(
    scanner: &mut Scanner,
    number_of_variables: usize,
    objective: Option<&Arc<SparseVector>>,
    expected: &str,
) -> Result<VectorPayload, Parse> {
    let (token, line) = scanner.next_word(expected)?;

    if token == "OBJ" {
        return match objective {
            Some(shared) => Ok(VectorPayload::Objective(Arc::clone(shared))),
            None => Err(Parse::with_location(
                "the objective cannot reference itself",
                (line, token),
            )),
        };
    }

    let count = usize::from_str(token).map_err(|_| {
        Parse::with_location(
            format!("expected a number of coefficients for {}, read \"{}\"", expected, token),
            (line, token),
        )
    })?;

    let mut vector = SparseVector::empty();
    for _ in 0..count {
        let index = scanner.next_usize("a variable index")?;
        if index >= number_of_variables {
            return Err(Parse::new(format!(
                "variable index {} out of range, {} variables are declared",
                index, number_of_variables,
            )));
        }
        let value = scanner.next_rational("a coefficient")?;
        vector.set(index, value);
    }

    Ok(VectorPayload::Own(vector))
}

/// The parts of a constraint record: label, sense, right hand side, coefficients.
type ConstraintParts = (String, ConstraintType, Rational, VectorPayload);

fn parse_constraint_parts(
    scanner: &mut Scanner,
    number_of_variables: usize,
    objective: Option<&Arc<SparseVector>>,
) -> Result<ConstraintParts, Parse> {
    let (label, _) = scanner.next_word("a constraint label")?;
    let label = label.to_string();

    let (sense, line) = scanner.next_word("a constraint sense")?;
    let sense = match sense {
        "E" => ConstraintType::Equal,
        "L" => ConstraintType::Less,
        "G" => ConstraintType::Greater,
        other => {
            return Err(Parse::with_location(
                format!("unknown sense \"{}\" for constraint \"{}\"", other, label),
                (line, other),
            ));
        }
    };

    let rhs = scanner.next_rational("a right hand side")?;
    let payload = parse_vector_payload(
        scanner,
        number_of_variables,
        objective,
        &format!("the coefficients of \"{}\"", label),
    )?;

    Ok((label, sense, rhs, payload))
}

fn build_constraint(parts: ConstraintParts, is_assumption: bool) -> Constraint {
    let (label, sense, rhs, payload) = parts;
    match payload {
        VectorPayload::Own(vector) => Constraint::new(label, sense, rhs, vector, is_assumption),
        VectorPayload::Objective(shared) => {
            Constraint::with_objective_coefficients(label, sense, rhs, shared, is_assumption)
        }
    }
}

fn parse_constraint(
    scanner: &mut Scanner,
    number_of_variables: usize,
    objective: Option<&Arc<SparseVector>>,
    is_assumption: bool,
) -> Result<Constraint, Parse> {
    let parts = parse_constraint_parts(scanner, number_of_variables, objective)?;
    Ok(build_constraint(parts, is_assumption))
}

/// Read a multiplier list `k index value …` over constraint indices.
///
/// Zero multipliers are kept; the checker ignores them but the writer reproduces them.
fn parse_multipliers(scanner: &mut Scanner, limit: usize) -> Result<SparseVector, Parse> {
    let count = scanner.next_usize("the number of multipliers")?;
    let mut multipliers = SparseVector::empty();
    for _ in 0..count {
        let index = parse_constraint_index(scanner, limit)?;
        let value = scanner.next_rational("a multiplier")?;
        multipliers.set(index, value);
    }
    Ok(multipliers)
}

fn parse_constraint_index(scanner: &mut Scanner, limit: usize) -> Result<usize, Parse> {
    let index = scanner.next_usize("a constraint index")?;
    if index >= limit {
        return Err(Parse::new(format!(
            "constraint index {} out of range, only {} constraints precede this derivation",
            index, limit,
        )));
    }
    Ok(index)
}

fn parse_derivation(
    scanner: &mut Scanner,
    number_of_variables: usize,
    objective: &Arc<SparseVector>,
    limit: usize,
) -> Result<Derivation, Parse> {
    let parts = parse_constraint_parts(scanner, number_of_variables, Some(objective))?;
    let label = parts.0.clone();

    scanner.expect("{")?;
    let (kind, line) = scanner.next_word("a derivation type")?;
    let reason = match kind {
        "asm" => {
            scanner.expect("}")?;
            Reason::Assumption
        }
        "sol" => {
            scanner.expect("}")?;
            Reason::Sol
        }
        "lin" => parse_lin_reason(scanner, number_of_variables, limit, &label)?,
        "rnd" => {
            let multipliers = parse_multipliers(scanner, limit)?;
            scanner.expect("}")?;
            Reason::Rnd(multipliers)
        }
        "uns" => {
            let constraint_1 = parse_constraint_index(scanner, limit)?;
            let assumption_1 = parse_constraint_index(scanner, limit)?;
            let constraint_2 = parse_constraint_index(scanner, limit)?;
            let assumption_2 = parse_constraint_index(scanner, limit)?;
            scanner.expect("}")?;
            Reason::Uns { constraint_1, assumption_1, constraint_2, assumption_2 }
        }
        other => {
            return Err(Parse::with_location(
                format!("unknown derivation type \"{}\" for \"{}\"", other, label),
                (line, other),
            ));
        }
    };

    let constraint = build_constraint(parts, matches!(reason, Reason::Assumption));
    let max_ref_idx = scanner.next_i64("the maximum reference index")?;

    Ok(Derivation { constraint, reason, max_ref_idx })
}

fn parse_lin_reason(
    scanner: &mut Scanner,
    number_of_variables: usize,
    limit: usize,
    label: &str,
) -> Result<Reason, Parse> {
    let (token, line) = scanner.next_word("multipliers")?;

    match token {
        "incomplete" => {
            let mut active = Vec::new();
            loop {
                let (entry, entry_line) = scanner.next_word("an active constraint index or \"}\"")?;
                if entry == "}" {
                    break;
                }
                let index = usize::from_str(entry).map_err(|_| {
                    Parse::with_location(
                        format!("expected an active constraint index, read \"{}\"", entry),
                        (entry_line, entry),
                    )
                })?;
                if index >= limit {
                    return Err(Parse::new(format!(
                        "active constraint index {} out of range in \"{}\", only {} constraints precede",
                        index, label, limit,
                    )));
                }
                active.push(index);
            }
            Ok(Reason::LinIncomplete(active))
        }
        "weak" => {
            scanner.expect("{")?;
            let count = scanner.next_usize("the number of bounds")?;
            let mut bounds = Vec::with_capacity(count);
            for _ in 0..count {
                let (direction, direction_line) = scanner.next_word("a bound type")?;
                let direction = match direction {
                    "L" => BoundDirection::Lower,
                    "U" => BoundDirection::Upper,
                    other => {
                        return Err(Parse::with_location(
                            format!("bound type does not match L/U, read \"{}\"", other),
                            (direction_line, other),
                        ));
                    }
                };
                let variable = scanner.next_usize("a variable index")?;
                if variable >= number_of_variables {
                    return Err(Parse::new(format!(
                        "variable index {} out of range, {} variables are declared",
                        variable, number_of_variables,
                    )));
                }
                let constraint = parse_constraint_index(scanner, limit)?;
                let value = scanner.next_rational("a bound value")?;
                bounds.push(WeakBound { direction, variable, constraint, value });
            }
            scanner.expect("}")?;

            let multipliers = parse_multipliers(scanner, limit)?;
            scanner.expect("}")?;
            Ok(Reason::LinWeak { bounds, multipliers })
        }
        _ => {
            let count = usize::from_str(token).map_err(|_| {
                Parse::with_location(
                    format!("expected a number of multipliers, read \"{}\"", token),
                    (line, token),
                )
            })?;
            let mut multipliers = SparseVector::empty();
            for _ in 0..count {
                let index = parse_constraint_index(scanner, limit)?;
                let value = scanner.next_rational("a multiplier")?;
                multipliers.set(index, value);
            }
            scanner.expect("}")?;
            Ok(Reason::Lin(multipliers))
        }
    }
}

#[cfg(test)]
mod test {
    use crate::data::certificate::elements::{ConstraintType, Objective, Rtp};
    use crate::data::certificate::Reason;
    use crate::io::vipr::parsing::parse;
    use crate::R;

    const SMALL: &str = "\
VER 1.0
VAR 2
x y
INT 2
0 1
OBJ min
2  0 1  1 1
CON 2 0
C1 G 1  2  0 4  1 1
C2 L 2  2  0 4  1 -1
RTP range 1 1
SOL 2
feas  2  0 0  1 2
opt  1  1 1
DER 2
C3 G -1/2  1  1 1  { lin  2  0 1/2  1 -1/2 } 3
C4 G 1 OBJ { rnd 1 2 1 } -1
";

    #[test]
    fn small_certificate() {
        let certificate = parse(SMALL).unwrap();

        assert_eq!(certificate.version, (1, 0));
        assert_eq!(certificate.variables.len(), 2);
        assert_eq!(certificate.variables[0].name, "x");
        assert!(certificate.variables[0].is_integer);
        assert_eq!(certificate.objective.direction, Objective::Minimize);
        assert!(certificate.objective.is_integral);
        assert_eq!(certificate.constraints.len(), 2);
        assert_eq!(certificate.constraints[0].sense(), ConstraintType::Greater);
        assert_eq!(certificate.constraints[0].rhs(), &R!(1));
        assert_eq!(certificate.rtp, Rtp::Range { lower: Some(R!(1)), upper: Some(R!(1)) });
        assert_eq!(certificate.solutions.len(), 2);
        assert_eq!(certificate.solutions[0].assignment.value_at(1), R!(2));

        assert_eq!(certificate.derivations.len(), 2);
        match &certificate.derivations[0].reason {
            Reason::Lin(multipliers) => {
                assert_eq!(multipliers.value_at(0), R!(1, 2));
                assert_eq!(multipliers.value_at(1), R!(-1, 2));
            }
            other => panic!("expected a lin reason, got {:?}", other),
        }
        assert_eq!(certificate.derivations[0].max_ref_idx, 3);
        assert!(certificate.derivations[1].constraint.has_objective_coefficients());
        assert_eq!(certificate.derivations[1].max_ref_idx, -1);
    }

    #[test]
    fn comments_and_blank_lines() {
        let text = SMALL.replace("CON 2 0", "% a full comment line\n\nCON 2 0 % trailing");
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn version_gate() {
        assert!(parse(&SMALL.replace("VER 1.0", "VER 1.1")).is_ok());
        assert!(parse(&SMALL.replace("VER 1.0", "VER 1.2")).is_err());
        assert!(parse(&SMALL.replace("VER 1.0", "VER 2.0")).is_err());
        assert!(parse(&SMALL.replace("VER 1.0", "VER 0.9")).is_err());
        assert!(parse(&SMALL.replace("VER 1.0", "VER one")).is_err());
    }

    #[test]
    fn wrong_section_order() {
        let text = SMALL.replace("INT 2\n0 1\n", "").replace("OBJ min", "INT 2\n0 1\nOBJ min");
        // INT and OBJ intact but in the original order; removing INT entirely must fail.
        assert!(parse(&SMALL.replace("INT 2\n0 1\n", "")).is_err());
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn out_of_range_indices() {
        assert!(parse(&SMALL.replace("INT 2\n0 1", "INT 1\n2")).is_err());
        assert!(parse(&SMALL.replace("C1 G 1  2  0 4  1 1", "C1 G 1  1  5 4")).is_err());
        // Derivation one may reference constraints 0 and 1 only.
        assert!(parse(&SMALL.replace("{ lin  2  0 1/2  1 -1/2 }", "{ lin  1  2 1 }")).is_err());
    }

    #[test]
    fn malformed_tokens() {
        assert!(parse(&SMALL.replace("C1 G 1", "C1 Q 1")).is_err());
        assert!(parse(&SMALL.replace("RTP range 1 1", "RTP range inf 1")).is_err());
        assert!(parse(&SMALL.replace("RTP range 1 1", "RTP range 2 1")).is_err());
        assert!(parse(&SMALL.replace("0 4", "0 4/0")).is_err());
        assert!(parse(&SMALL.replace("RTP range 1 1", "RTP maybe")).is_err());
    }

    #[test]
    fn derivation_reasons() {
        let text = SMALL
            .replace("{ lin  2  0 1/2  1 -1/2 }", "{ lin incomplete 0 1 }")
            .replace("{ rnd 1 2 1 }", "{ lin weak { 1 L 0 0 0 } 1  0 1/4 }");
        let certificate = parse(&text).unwrap();

        assert!(matches!(&certificate.derivations[0].reason, Reason::LinIncomplete(active) if active == &vec![0, 1]));
        match &certificate.derivations[1].reason {
            Reason::LinWeak { bounds, multipliers } => {
                assert_eq!(bounds.len(), 1);
                assert_eq!(bounds[0].variable, 0);
                assert_eq!(multipliers.value_at(0), R!(1, 4));
            }
            other => panic!("expected a weak lin reason, got {:?}", other),
        }
    }

    #[test]
    fn assumption_flag() {
        let text = SMALL.replace("{ lin  2  0 1/2  1 -1/2 }", "{ asm }");
        let certificate = parse(&text).unwrap();
        assert!(certificate.derivations[0].constraint.is_assumption());
        assert!(!certificate.derivations[1].constraint.is_assumption());
    }
}
