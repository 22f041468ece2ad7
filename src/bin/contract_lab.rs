//! Command-line entry point: evaluate a scenario file and print the report.
//!
//! ```text
//! contract_lab demos/wholesale_normal.json
//! ```
//!
//! The report is written to stdout as pretty JSON; logs go to stderr and are
//! filtered by `RUST_LOG`.

use std::process::ExitCode;

use contractlab::core::{ContractError, load_scenario, to_json_pretty};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "contractlab=info,warn";

fn run(path: &str) -> Result<String, ContractError> {
    let scenario = load_scenario(path)?;
    let report = scenario.evaluate()?;
    Ok(to_json_pretty(&report)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: contract_lab <scenario.json>");
        return ExitCode::FAILURE;
    };

    match run(&path) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "evaluation failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
