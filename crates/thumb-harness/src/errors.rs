//! Error types for image loading, manifests, and reporting.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the harness.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// A malformed line in a hex program image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ImageError {
    /// 1-indexed source line.
    pub line: usize,
    /// What was wrong with the line.
    pub message: String,
}

impl ImageError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Every failure the harness reports before or after a run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A hex image contained a malformed line.
    #[error("{}:{source}", path.display())]
    Image {
        /// Image file.
        path: PathBuf,
        /// Offending line.
        #[source]
        source: ImageError,
    },
    /// A suite manifest was not valid TOML or had the wrong shape.
    #[error("{}: {source}", path.display())]
    Manifest {
        /// Manifest file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },
    /// A setting was outside its accepted range.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A report could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
