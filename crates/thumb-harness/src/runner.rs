//! Runs images on the simulator and checks their signature word.
//!
//! A program signals its result by storing a word at the signature address
//! and then branching to itself. A trapped core is reported with its cause
//! but only fails when the signature is wrong.

use std::fmt;

use tracing::{info, warn};

use thumb_core::{
    ControlState, CoreConfig, Diagnostics, StepOutcome, System, TraceEvent, TrapRecord,
};

use crate::config::{RunSettings, SuiteManifest};
use crate::errors::Result;
use crate::image::load_image;

/// Outcome of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Address the signature was read from.
    pub signature_address: u32,
    /// Word found at the signature address.
    pub signature: u32,
    /// Expected signature, when checked.
    pub expected: Option<u32>,
    /// Cycles clocked.
    pub cycles: u64,
    /// Control state after the last cycle.
    pub final_state: ControlState,
    /// Program counter after the last cycle.
    pub pc: u32,
    /// `true` once a branch-to-self retired.
    pub halted: bool,
    /// Trap taken, if any.
    pub trap: Option<TrapRecord>,
    /// Counters at the end of the run.
    pub diagnostics: Diagnostics,
    /// Captured events when tracing was requested.
    pub trace: Vec<TraceEvent>,
}

impl RunReport {
    /// `true` unless a signature check failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        !matches!(self.expected, Some(expected) if expected != self.signature)
    }

    fn state_summary(&self) -> String {
        if let Some(trap) = &self.trap {
            format!("trapped at {:#010x}: {}", trap.pc, trap.cause)
        } else if self.halted {
            format!("halted at {:#010x}", self.pc)
        } else {
            format!("running ({:?}) at {:#010x}", self.final_state, self.pc)
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "signature [{:#010x}] = {:#010x}",
            self.signature_address, self.signature
        )?;
        if let Some(expected) = self.expected {
            writeln!(f, "expected              {expected:#010x}")?;
        }
        writeln!(
            f,
            "cycles {}, retired {}, loads {}, stores {}",
            self.cycles,
            self.diagnostics.retired,
            self.diagnostics.loads,
            self.diagnostics.stores
        )?;
        writeln!(f, "state: {}", self.state_summary())?;
        write!(f, "{}", if self.passed() { "PASS" } else { "FAIL" })
    }
}

/// Runs `image` from reset under `settings`.
#[must_use]
pub fn run_image(image: &[u32], settings: &RunSettings) -> RunReport {
    let config = CoreConfig {
        shift_by_zero: settings.shift_by_zero,
        tracing_enabled: settings.trace,
    };
    let mut sys = System::with_image(image, config);
    let mut halted = false;

    while sys.cycle() < settings.cycles {
        match sys.step() {
            StepOutcome::Retired(retired) if retired.is_self_loop() => {
                halted = true;
                if settings.stop_on_halt {
                    break;
                }
            }
            StepOutcome::Trapped(_) if settings.stop_on_halt => break,
            _ => {}
        }
    }

    let diagnostics = *sys.diagnostics();
    if let Some(trap) = diagnostics.last_trap {
        warn!(pc = trap.pc, cause = %trap.cause, "program trapped");
    }

    RunReport {
        signature_address: settings.signature_address,
        signature: sys.bus().read_word(settings.signature_address),
        expected: settings.expected,
        cycles: sys.cycle(),
        final_state: sys.control_state(),
        pc: sys.core().arch.pc(),
        halted,
        trap: diagnostics.last_trap,
        diagnostics,
        trace: sys.take_trace(),
    }
}

/// Result of every case in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    /// `(case name, report)` in manifest order.
    pub results: Vec<(String, RunReport)>,
}

impl SuiteReport {
    /// Number of passing cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|(_, report)| report.passed()).count()
    }

    /// `true` when every case passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed() == self.results.len()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, report) in &self.results {
            let verdict = if report.passed() { "PASS" } else { "FAIL" };
            writeln!(
                f,
                "{verdict} {name}: signature {:#010x} after {} cycles, {}",
                report.signature,
                report.cycles,
                report.state_summary()
            )?;
        }
        write!(
            f,
            "{} passed, {} failed, {} total",
            self.passed(),
            self.results.len() - self.passed(),
            self.results.len()
        )
    }
}

/// Loads and runs every case in `manifest`.
///
/// # Errors
///
/// Returns the first image that cannot be loaded.
pub fn run_suite(manifest: &SuiteManifest) -> Result<SuiteReport> {
    let mut results = Vec::with_capacity(manifest.cases.len());
    for case in &manifest.cases {
        let name = case.display_name();
        info!(case = %name, image = %case.image.display(), "running case");
        let image = load_image(&case.image)?;
        results.push((name, run_image(&image, &case.settings())));
    }
    Ok(SuiteReport { results })
}
