use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use vipr::algorithm::check::{verify, CheckOutcome};
use vipr::io::import;

/// Verify a mixed-integer programming certificate in exact rational arithmetic.
#[derive(Parser)]
#[command(name = "viprchk", version)]
struct Opts {
    /// Certificate file to verify
    certificate: PathBuf,
}

fn main() {
    let opts: Opts = Opts::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Reading certificate file: \"{}\"...", opts.certificate.display());
    let (certificate, _) = match import(&opts.certificate) {
        Ok(parsed) => parsed,
        Err(error) => {
            eprintln!("{}", error);
            eprintln!("Verification failed.");
            exit(1);
        }
    };
    println!(
        "Certificate format version {}.{}",
        certificate.version.0, certificate.version.1,
    );

    match verify(&certificate) {
        Ok(CheckOutcome::InfeasibilityVerified) => {
            println!("Successfully verified infeasibility.");
        }
        Ok(CheckOutcome::RangeVerified) => {
            println!("Successfully verified the optimal value range.");
        }
        Ok(CheckOutcome::TautologicalBound) => {
            println!("Dual bound of the relation to prove is a tautology.");
            println!("Successfully verified.");
        }
        Err(error) => {
            eprintln!("{}", error);
            eprintln!("Verification failed.");
            exit(1);
        }
    }
}
