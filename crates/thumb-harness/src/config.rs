//! Suite manifests and per-run settings.
//!
//! A manifest is a TOML file with one `[[case]]` table per program:
//!
//! ```toml
//! [[case]]
//! name = "arith"
//! image = "arith.hex"
//! cycles = 1000
//! signature_address = 0x100
//! expected = 10
//! shift_by_zero = "strict32"
//! ```
//!
//! Image paths are resolved against the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thumb_core::ShiftByZeroPolicy;

use crate::errors::{HarnessError, Result};

/// Cycle budget when none is given.
pub const DEFAULT_CYCLES: u64 = 10_000;

/// Word address the signature is read from when none is given.
pub const DEFAULT_SIGNATURE_ADDRESS: u32 = 0x100;

const fn default_cycles() -> u64 {
    DEFAULT_CYCLES
}

const fn default_signature_address() -> u32 {
    DEFAULT_SIGNATURE_ADDRESS
}

/// Everything one simulation run needs besides the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Cycle budget.
    pub cycles: u64,
    /// Address of the signature word.
    pub signature_address: u32,
    /// Expected signature; `None` runs without a check.
    pub expected: Option<u32>,
    /// Shift-right-by-zero behavior of the core.
    pub shift_by_zero: ShiftByZeroPolicy,
    /// Stop early once the program branches to itself or traps.
    pub stop_on_halt: bool,
    /// Capture trace events.
    pub trace: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_CYCLES,
            signature_address: DEFAULT_SIGNATURE_ADDRESS,
            expected: None,
            shift_by_zero: ShiftByZeroPolicy::BUILD_DEFAULT,
            stop_on_halt: false,
            trace: false,
        }
    }
}

impl RunSettings {
    /// Rejects settings no run can satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] for a zero cycle budget or an
    /// unaligned signature address.
    pub fn validate(&self) -> Result<()> {
        if self.cycles == 0 {
            return Err(HarnessError::Config("cycles must be non-zero".to_string()));
        }
        if self.signature_address % 4 != 0 {
            return Err(HarnessError::Config(format!(
                "signature address {:#010x} is not word aligned",
                self.signature_address
            )));
        }
        Ok(())
    }
}

/// One `[[case]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    /// Display name; defaults to the image file stem.
    #[serde(default)]
    pub name: Option<String>,
    /// Program image, relative to the manifest.
    pub image: PathBuf,
    /// Cycle budget.
    #[serde(default = "default_cycles")]
    pub cycles: u64,
    /// Address of the signature word.
    #[serde(default = "default_signature_address")]
    pub signature_address: u32,
    /// Expected signature.
    pub expected: u32,
    /// Overrides the build-default shift policy.
    #[serde(default)]
    pub shift_by_zero: Option<ShiftByZeroPolicy>,
    /// Stop once the program parks.
    #[serde(default)]
    pub stop_on_halt: bool,
}

impl CaseConfig {
    /// Name shown in reports.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.image
                .file_stem()
                .map_or_else(|| self.image.display().to_string(), |stem| {
                    stem.to_string_lossy().into_owned()
                })
        })
    }

    /// Run settings for this case.
    #[must_use]
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            cycles: self.cycles,
            signature_address: self.signature_address,
            expected: Some(self.expected),
            shift_by_zero: self.shift_by_zero.unwrap_or_default(),
            stop_on_halt: self.stop_on_halt,
            trace: false,
        }
    }
}

/// Parsed suite manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteManifest {
    /// Cases in file order.
    #[serde(default, rename = "case")]
    pub cases: Vec<CaseConfig>,
}

impl SuiteManifest {
    /// Parses manifest text. Image paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input.
    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads a manifest, validates every case, and resolves image paths
    /// against the manifest's directory.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`], [`HarnessError::Manifest`], or
    /// [`HarnessError::Config`] for an empty suite or invalid case.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| HarnessError::io(path, source))?;
        let mut manifest = Self::parse(&text).map_err(|source| HarnessError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;

        if manifest.cases.is_empty() {
            return Err(HarnessError::Config(format!(
                "{} lists no [[case]] tables",
                path.display()
            )));
        }

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for case in &mut manifest.cases {
            case.settings().validate().map_err(|error| {
                HarnessError::Config(format!("case `{}`: {error}", case.display_name()))
            })?;
            if case.image.is_relative() {
                case.image = base.join(&case.image);
            }
        }

        Ok(manifest)
    }
}
