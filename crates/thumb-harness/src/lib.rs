//! Program loader, signature checker, and command-line driver for the
//! `thumb-core` simulator.

/// Command-line definition and subcommand dispatch.
pub mod cli;
/// Suite manifests and run settings.
pub mod config;
/// Harness error types.
pub mod errors;
/// Hex and binary program images.
pub mod image;
/// Diagnostic log setup.
pub mod logging;
/// Simulation runs and reports.
pub mod runner;

pub use config::{CaseConfig, RunSettings, SuiteManifest};
pub use errors::{HarnessError, ImageError, Result};
pub use runner::{run_image, run_suite, RunReport, SuiteReport};
