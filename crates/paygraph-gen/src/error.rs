//! Error types for the `paygraph-gen` binary.

use std::path::PathBuf;

use paygraph_gen::GeneratorError;

/// Top-level error for the `paygraph-gen` binary.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// The command line could not be understood.
    #[error("usage: {0}")]
    Usage(String),

    /// A flag or positional argument needed a value that was not given.
    #[error("{what} needs a value")]
    MissingValue {
        /// The argument lacking its value.
        what: &'static str,
    },

    /// A numeric argument did not parse.
    #[error("invalid {what} {value:?}: {reason}")]
    InvalidNumber {
        /// The argument being parsed.
        what: &'static str,
        /// The text that was given.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The names file could not be read.
    #[error("cannot read names file {path}: {source}")]
    ReadNames {
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

    /// Generating or writing the records failed.
    #[error("generation into {path} failed: {source}")]
    Generate {
        /// Output path being written.
        path: PathBuf,
        /// The underlying generator error.
        source: GeneratorError,
    },
}
