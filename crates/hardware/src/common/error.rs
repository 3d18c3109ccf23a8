//! Simulation error definitions.
//!
//! This module defines the error type surfaced by the library. It covers:
//! 1. **Input Failures:** Files that cannot be opened or parsed.
//! 2. **Output Failures:** Files that cannot be created, and write errors
//!    raised while emitting traces and dumps.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the simulator library.
///
/// File-path variants carry the offending path so the caller can report every
/// failure before giving up instead of stopping at the first one.
#[derive(Debug, Error)]
pub enum SimError {
    /// An input file could not be opened for reading.
    #[error("failed to open input file '{path}': {source}")]
    OpenInput {
        /// Path of the file that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// An output file could not be created.
    #[error("failed to create output file '{path}': {source}")]
    CreateOutput {
        /// Path of the file that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A line of a hex input file did not parse as a 32-bit hex word.
    #[error("'{path}' line {line}: not an 8-digit hex word")]
    BadHexWord {
        /// Path of the malformed file.
        path: PathBuf,
        /// One-based line number of the malformed word.
        line: usize,
    },

    /// An I/O error was raised while reading inputs or writing traces and
    /// dumps.
    #[error("simulation i/o error: {0}")]
    Io(#[from] io::Error),

    /// The JSON configuration file was malformed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
