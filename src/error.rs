// src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error type. Every failure mode of the generation run maps to
/// exactly one variant so the CLI can print a single descriptive line.
#[derive(Debug, Error)]
pub enum Error {
    /// A generation parameter is outside its allowed range.
    #[error("invalid parameter: {0}")]
    Config(String),

    /// The input structure file does not exist or is not a regular file.
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Read or write failure on a structure file.
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output directory could not be created (permissions, bad path).
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A structure file exists but its contents do not parse.
    #[error("malformed structure file {}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    /// A structure cannot be transformed (e.g. singular lattice).
    #[error("invalid structure: {0}")]
    InvalidInput(String),

    /// Numeric failure while rattling atomic positions.
    #[error("rattle failed: {0}")]
    Processing(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
