//! # The completion engine
//!
//! Fills in the missing multipliers of `weak` and `incomplete` derivations. Derivations are
//! independent of each other once the constraint list is loaded, so the engine runs a three
//! stage pipeline: a serial stage hands out warm start LP contexts from a ring buffer, a
//! parallel stage reconstructs multipliers, and a serial stage returns the contexts and
//! reassembles the results in input order.
use std::collections::BTreeMap;
use std::thread;

use crossbeam_channel::bounded;
use log::info;

use crate::algorithm::complete::bounds::GlobalBounds;
use crate::algorithm::complete::incomplete::{complete_incomplete, LpContext};
use crate::algorithm::complete::weak::complete_weak;
use crate::algorithm::error::Verification;
use crate::algorithm::oracle::{LpOracle, SimplexOracle};
use crate::data::certificate::{Certificate, Constraint, Reason};
use crate::data::linear_algebra::SparseVector;

pub mod bounds;
mod incomplete;
mod weak;

/// Settings of a completion run.
#[derive(Clone, Debug)]
pub struct CompletionOptions {
    /// Whether the LP oracle may be used. Without it only weak derivations can be completed;
    /// meeting an incomplete derivation is then an error.
    pub use_oracle: bool,
    /// Worker count; zero means the available parallelism.
    pub threads: usize,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self { use_oracle: true, threads: 0 }
    }
}

/// A unit of work travelling from stage one to stage two.
struct Job<O> {
    sequence: usize,
    derivation: usize,
    context: Option<LpContext<O>>,
}

/// The product of stage two, consumed in order by stage three.
struct Outcome<O> {
    sequence: usize,
    result: Result<Option<SparseVector>, Verification>,
    context: Option<LpContext<O>>,
}

/// Complete a certificate with the built-in exact simplex oracle.
pub fn complete(
    certificate: &Certificate,
    options: &CompletionOptions,
) -> Result<Certificate, Verification> {
    complete_with(certificate, options, SimplexOracle::new)
}

/// Complete a certificate, building LP oracles with the provided constructor.
///
/// # Return value
///
/// A certificate equal to the input except that completed derivations carry their full
/// multiplier list (and a disabled reference index). Derivations the oracle could not complete
/// are re-emitted unchanged with a warning; every other completion failure is fatal.
pub fn complete_with<O, F>(
    certificate: &Certificate,
    options: &CompletionOptions,
    build_oracle: F,
) -> Result<Certificate, Verification>
where
    O: LpOracle + Send,
    F: Fn() -> O,
{
    let to_complete: Vec<usize> = certificate
        .derivations
        .iter()
        .enumerate()
        .filter(|(_, derivation)| derivation.reason.needs_completion())
        .map(|(index, _)| index)
        .collect();

    if to_complete.is_empty() {
        info!("nothing to complete");
        return Ok(certificate.clone());
    }

    // Constraints visible during completion: the problem constraints followed by all declared
    // derived constraints. Completion never trashes, and mutates none of this.
    let mut table = certificate.constraints.clone();
    table.extend(certificate.derivations.iter().map(|derivation| derivation.constraint.clone()));
    let globals = GlobalBounds::build(certificate);

    let worker_count = match options.threads {
        0 => thread::available_parallelism().map(|count| count.get()).unwrap_or(1),
        threads => threads,
    }
    .min(to_complete.len())
    .max(1);
    info!("completing {} derivations using {} workers", to_complete.len(), worker_count);

    let (context_tx, context_rx) = bounded(2 * worker_count);
    if options.use_oracle {
        for _ in 0..2 * worker_count {
            let context = LpContext::new(certificate, build_oracle());
            let _ = context_tx.send(context);
        }
    }

    let (job_tx, job_rx) = bounded::<Job<O>>(worker_count);
    let (result_tx, result_rx) = bounded::<Outcome<O>>(2 * worker_count);

    let mut outcomes: BTreeMap<usize, Result<Option<SparseVector>, Verification>> = BTreeMap::new();

    thread::scope(|scope| {
        // Stage one, serial and ordered: pair each derivation with a warm start context.
        let producer_jobs = to_complete.clone();
        let use_oracle = options.use_oracle;
        scope.spawn(move || {
            for (sequence, derivation) in producer_jobs.into_iter().enumerate() {
                let context = if use_oracle {
                    match context_rx.recv() {
                        Ok(context) => Some(context),
                        Err(_) => break,
                    }
                } else {
                    None
                };
                if job_tx.send(Job { sequence, derivation, context }).is_err() {
                    break;
                }
            }
        });

        // Stage two, parallel: the actual reconstruction work.
        for _ in 0..worker_count {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let table = &table;
            let globals = &globals;
            scope.spawn(move || {
                for mut job in job_rx.iter() {
                    let result = run_one(
                        certificate,
                        table,
                        globals,
                        job.derivation,
                        &mut job.context,
                    );
                    let sent = result_tx.send(Outcome {
                        sequence: job.sequence,
                        result,
                        context: job.context,
                    });
                    if sent.is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        // Stage three, serial and ordered: recycle contexts, collect results by sequence.
        for outcome in result_rx.iter() {
            if let Some(context) = outcome.context {
                let _ = context_tx.send(context);
            }
            outcomes.insert(outcome.sequence, outcome.result);
        }
    });

    let mut completed_certificate = certificate.clone();
    let mut completed_count = 0;
    for (sequence, &derivation_index) in to_complete.iter().enumerate() {
        match outcomes.remove(&sequence) {
            Some(Ok(Some(multipliers))) => {
                let derivation = &mut completed_certificate.derivations[derivation_index];
                derivation.reason = Reason::Lin(multipliers);
                // Completion invalidates the trashing schedule for this constraint.
                derivation.max_ref_idx = -1;
                completed_count += 1;
            }
            // The oracle gave up; the derivation stays incomplete.
            Some(Ok(None)) => {}
            Some(Err(error)) => return Err(error),
            None => {
                return Err(Verification::OracleDisabled {
                    derivation: certificate.derivations[derivation_index]
                        .constraint
                        .label()
                        .to_string(),
                });
            }
        }
    }

    info!("completed {} out of {} derivations", completed_count, to_complete.len());
    Ok(completed_certificate)
}

fn run_one<O: LpOracle>(
    certificate: &Certificate,
    table: &[Constraint],
    globals: &GlobalBounds,
    derivation_index: usize,
    context: &mut Option<LpContext<O>>,
) -> Result<Option<SparseVector>, Verification> {
    let derivation = &certificate.derivations[derivation_index];
    match &derivation.reason {
        Reason::LinWeak { bounds, multipliers } => {
            complete_weak(&derivation.constraint, bounds, multipliers, table, globals).map(Some)
        }
        Reason::LinIncomplete(active_set) => {
            let context = match context {
                Some(context) => context,
                None => {
                    return Err(Verification::OracleDisabled {
                        derivation: derivation.constraint.label().to_string(),
                    });
                }
            };
            complete_incomplete(
                context,
                &derivation.constraint,
                active_set,
                table,
                certificate.variables.len(),
            )
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::check::{verify, CheckOutcome};
    use crate::algorithm::complete::{complete, CompletionOptions};
    use crate::data::certificate::Reason;
    use crate::io::vipr::parsing::parse;
    use crate::R;

    const WEAK: &str = "\
VER 1.1
VAR 2
x y
INT 2
0 1
OBJ min 2 0 1 1 1
CON 3 1
YLB G 0 1 1 1
C1 G 1 2 0 4 1 1
C2 L 2 2 0 4 1 -1
RTP range 1/4 inf
SOL 1
opt 1 1 1
DER 1
D1 G 1/4 OBJ { lin weak { 0 } 1 1 1/4 } -1
";

    #[test]
    fn weak_completion_rechecks() {
        let certificate = parse(WEAK).unwrap();
        let options = CompletionOptions { use_oracle: false, threads: 1 };
        let completed = complete(&certificate, &options).unwrap();

        match &completed.derivations[0].reason {
            Reason::Lin(multipliers) => {
                assert_eq!(multipliers.value_at(1), R!(1, 4));
                assert_eq!(multipliers.value_at(0), R!(3, 4));
            }
            other => panic!("expected a completed lin reason, got {:?}", other),
        }
        assert_eq!(completed.derivations[0].max_ref_idx, -1);

        assert_eq!(verify(&completed), Ok(CheckOutcome::RangeVerified));
    }

    #[test]
    fn incomplete_without_oracle_is_fatal() {
        let text = WEAK.replace("{ lin weak { 0 } 1 1 1/4 }", "{ lin incomplete 0 1 2 }");
        let certificate = parse(&text).unwrap();
        let options = CompletionOptions { use_oracle: false, threads: 1 };
        assert!(complete(&certificate, &options).is_err());
    }

    #[test]
    fn complete_is_idempotent_on_complete_certificates() {
        let text = WEAK.replace("{ lin weak { 0 } 1 1 1/4 }", "{ lin 2 0 3/4 1 1/4 }");
        let certificate = parse(&text).unwrap();
        let completed = complete(&certificate, &CompletionOptions::default()).unwrap();
        assert!(matches!(&completed.derivations[0].reason, Reason::Lin(_)));
        assert_eq!(completed.derivations[0].max_ref_idx, -1);
    }
}
