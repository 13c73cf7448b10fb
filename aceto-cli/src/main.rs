use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use aceto_io::StdIo;
use aceto_vm::{ExitOutcome, Interpreter};

/// Aceto interpreter
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Source file to load and run
    source: PathBuf,

    /// Raise the log level to debug
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().filter_or("ACETO_LOG", default_level);
    env_logger::init_from_env(env);

    let source = std::fs::read_to_string(&args.source)
        .with_context(|| format!("failed to read source file {:?}", args.source))?;

    let seed = match std::env::var("ACETO_SEED") {
        Ok(s) => Some(s.parse::<u64>().with_context(|| format!("ACETO_SEED {s:?} is not a valid u64"))?),
        Err(_) => None,
    };

    let start = std::time::Instant::now();
    let mut interp = Interpreter::new(&source, seed, StdIo::new());
    let outcome = interp.run();
    info!("startup complete in {:?}", start.elapsed());

    match outcome {
        ExitOutcome::Normal(reason) => {
            info!("program terminated normally ({reason:?})");
            Ok(ExitCode::SUCCESS)
        }
        ExitOutcome::Runtime(run_error) => {
            error!("{run_error}");
            Ok(ExitCode::from(1))
        }
        ExitOutcome::Load(load_error) => {
            error!("{load_error}");
            Ok(ExitCode::from(2))
        }
    }
}
