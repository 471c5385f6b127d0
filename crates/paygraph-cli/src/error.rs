//! Error types for the `rolling-median` binary.

use std::path::PathBuf;

use paygraph_core::{ConfigError, StreamError};

/// Top-level error for the `rolling-median` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The command line could not be understood.
    #[error("usage: {0}")]
    Usage(String),

    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The input file could not be opened.
    #[error("cannot open input {path}: {source}")]
    OpenInput {
        /// Path that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The output file could not be created.
    #[error("cannot create output {path}: {source}")]
    CreateOutput {
        /// Path that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading input or writing output failed mid-run.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream hit an unrecoverable inconsistency.
    #[error("line {line}: {source}")]
    Stream {
        /// 1-based input line number.
        line: usize,
        /// The underlying stream error.
        source: StreamError,
    },
}
