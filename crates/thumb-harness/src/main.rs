//! `thumb-run` entry point.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use serde as _;
use thiserror as _;
use thumb_core as _;
use thumb_harness::cli::{execute, Cli};
use thumb_harness::logging;
use toml as _;
use tracing as _;
use tracing_subscriber as _;
#[cfg(test)]
use tempfile as _;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let stdout = io::stdout();
    match execute(&cli.command, &mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(2)
        }
    }
}
