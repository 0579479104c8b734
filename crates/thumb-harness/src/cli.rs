//! Command-line interface of `thumb-run`.

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use thumb_core::{disassemble_window, ShiftByZeroPolicy, WordMemory};

use crate::config::{RunSettings, SuiteManifest, DEFAULT_CYCLES, DEFAULT_SIGNATURE_ADDRESS};
use crate::errors::{HarnessError, Result};
use crate::image::load_image;
use crate::runner::{run_image, run_suite};

/// Runs Thumb program images on the cycle-accurate core and checks their
/// signature word.
#[derive(Debug, Parser)]
#[command(name = "thumb-run", version)]
pub struct Cli {
    /// Raise log verbosity (`-v` info, `-vv` debug, `-vvv` trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one image and report its signature.
    Run(RunArgs),
    /// Run every case in a TOML manifest.
    Suite {
        /// Manifest path.
        manifest: PathBuf,
    },
    /// List an image as instructions.
    Disasm(DisasmArgs),
}

/// Options of `thumb-run run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Hex text or `.bin` image.
    pub image: PathBuf,

    /// Cycle budget.
    #[arg(long, default_value_t = DEFAULT_CYCLES)]
    pub cycles: u64,

    /// Address of the signature word.
    #[arg(long, value_name = "ADDR", value_parser = parse_u32, default_value_t = DEFAULT_SIGNATURE_ADDRESS)]
    pub signature_address: u32,

    /// Expected signature; the run fails on mismatch.
    #[arg(long, value_name = "VALUE", value_parser = parse_u32)]
    pub expected: Option<u32>,

    /// Shift-right-by-zero behavior (`legacy` or `strict32`).
    #[arg(long, value_name = "POLICY", value_parser = parse_policy)]
    pub shift_by_zero: Option<ShiftByZeroPolicy>,

    /// Stop once the program branches to itself or traps.
    #[arg(long)]
    pub stop_on_halt: bool,

    /// Print every trace event after the run.
    #[arg(long)]
    pub trace: bool,
}

impl RunArgs {
    /// Run settings selected by these options.
    #[must_use]
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            cycles: self.cycles,
            signature_address: self.signature_address,
            expected: self.expected,
            shift_by_zero: self.shift_by_zero.unwrap_or_default(),
            stop_on_halt: self.stop_on_halt,
            trace: self.trace,
        }
    }
}

/// Options of `thumb-run disasm`.
#[derive(Debug, Args)]
pub struct DisasmArgs {
    /// Hex text or `.bin` image.
    pub image: PathBuf,

    /// First address to list.
    #[arg(long, value_name = "ADDR", value_parser = parse_u32, default_value_t = 0)]
    pub start: u32,

    /// Halfwords to list; defaults to the rest of the image.
    #[arg(long)]
    pub count: Option<usize>,
}

/// Parses a decimal or `0x`-prefixed hex number.
///
/// # Errors
///
/// Returns a message naming the rejected text.
pub fn parse_u32(text: &str) -> std::result::Result<u32, String> {
    let cleaned = text.replace('_', "");
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => cleaned.parse(),
    };
    parsed.map_err(|error| format!("`{text}`: {error}"))
}

fn parse_policy(text: &str) -> std::result::Result<ShiftByZeroPolicy, String> {
    ShiftByZeroPolicy::from_name(text)
        .ok_or_else(|| format!("`{text}` is not a policy (expected legacy or strict32)"))
}

/// Executes a subcommand, writing its report to `out`.
///
/// Returns `true` when every check passed.
///
/// # Errors
///
/// Returns load, manifest, configuration, and output errors.
pub fn execute(command: &Command, out: &mut dyn Write) -> Result<bool> {
    match command {
        Command::Run(args) => {
            let settings = args.settings();
            settings.validate()?;
            let image = load_image(&args.image)?;
            let report = run_image(&image, &settings);
            for event in &report.trace {
                writeln!(out, "{event:?}")?;
            }
            writeln!(out, "{report}")?;
            Ok(report.passed())
        }
        Command::Suite { manifest } => {
            let manifest = SuiteManifest::load(manifest)?;
            let report = run_suite(&manifest)?;
            writeln!(out, "{report}")?;
            Ok(report.all_passed())
        }
        Command::Disasm(args) => {
            let image = load_image(&args.image)?;
            let memory = WordMemory::with_image(&image);
            let skipped = usize::try_from(args.start / 2).unwrap_or(usize::MAX);
            let available = (memory.len_words() * 2).saturating_sub(skipped);
            let count = match args.count {
                Some(count) if count > available => {
                    return Err(HarnessError::Config(format!(
                        "--count {count} exceeds the {available} halfwords \
                         from {:#010x} to the end of memory",
                        args.start
                    )));
                }
                Some(count) => count,
                None => (image.len() * 2).saturating_sub(skipped),
            };
            for row in disassemble_window(&memory, args.start, count) {
                writeln!(out, "{:08x}:  {:04x}  {}", row.address, row.word, row.text)?;
            }
            Ok(true)
        }
    }
}
