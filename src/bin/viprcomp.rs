use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use log::LevelFilter;

use vipr::algorithm::complete::{complete, CompletionOptions};
use vipr::io::{export, import};

/// Complete the under-specified derivations of a mixed-integer programming certificate.
#[derive(Parser)]
#[command(name = "viprcomp", version)]
struct Opts {
    /// Certificate file to be completed
    certificate: PathBuf,
    /// Use the exact LP oracle to complete derivations; must be on when the certificate holds
    /// incomplete derivations, turn off to boost performance when only weak ones are present
    #[arg(long, default_value = "on", value_parser = parse_toggle)]
    oracle: bool,
    /// Verbosity level
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=5))]
    verbosity: u8,
    /// Enable extra debug output
    #[arg(long, default_value = "off", value_parser = parse_toggle)]
    debugmode: bool,
    /// Maximal number of threads to use; 0 means all that are available
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Output path; defaults to the input with its extension replaced by `_complete.vipr`
    #[arg(long)]
    outfile: Option<PathBuf>,
}

fn parse_toggle(value: &str) -> Result<bool, String> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("expected on or off, read \"{}\"", other)),
    }
}

fn level_filter(verbosity: u8, debugmode: bool) -> LevelFilter {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 | 3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if debugmode && level < LevelFilter::Debug {
        LevelFilter::Debug
    } else {
        level
    }
}

/// The completed certificate lands next to the input by default.
fn default_output(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    let stem = match text.rfind('.') {
        Some(position) => &text[..position],
        None => text.as_ref(),
    };
    PathBuf::from(format!("{}_complete.vipr", stem))
}

fn main() {
    let opts: Opts = Opts::parse();

    env_logger::Builder::new()
        .filter_level(level_filter(opts.verbosity, opts.debugmode))
        .init();

    println!("Reading certificate file: \"{}\"...", opts.certificate.display());
    let (certificate, line_ending) = match import(&opts.certificate) {
        Ok(parsed) => parsed,
        Err(error) => {
            eprintln!("{}", error);
            exit(1);
        }
    };

    let options = CompletionOptions { use_oracle: opts.oracle, threads: opts.threads };
    let completed = match complete(&certificate, &options) {
        Ok(completed) => completed,
        Err(error) => {
            eprintln!("{}", error);
            exit(1);
        }
    };

    let outfile = opts.outfile.unwrap_or_else(|| default_output(&opts.certificate));
    if let Err(error) = export(&outfile, &completed, line_ending) {
        eprintln!("{}", error);
        exit(1);
    }

    println!("Completion of file successful, wrote \"{}\".", outfile.display());
}
