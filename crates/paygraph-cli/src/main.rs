//! Rolling median degree over a file of payment records.
//!
//! Reads one payment record per line, maintains the payment graph over a
//! trailing window, and writes the median vertex degree after each record
//! as a line with two decimals.
//!
//! ```text
//! rolling-median [INPUT] [OUTPUT]
//! ```
//!
//! `INPUT` defaults to `venmo_input/venmo-trans.txt` and `OUTPUT` to
//! `venmo_output/output.txt`. Logs go to stderr; `RUST_LOG` overrides the
//! configured level.

mod error;
mod pipeline;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use paygraph_core::{MedianStream, PaygraphConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Input path used when none is given.
const DEFAULT_INPUT: &str = "venmo_input/venmo-trans.txt";

/// Output path used when none is given.
const DEFAULT_OUTPUT: &str = "venmo_output/output.txt";

/// Application entry point.
///
/// # Errors
///
/// Returns [`CliError`] if the configuration, input or output cannot be
/// opened, or if processing fails unrecoverably.
fn main() -> Result<(), CliError> {
    let config = PaygraphConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let (input, output) = parse_args(std::env::args().skip(1))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        window_seconds = config.window.span_seconds,
        "rolling-median starting"
    );

    let started = Instant::now();
    let (reader, writer) = open_streams(&input, &output)?;

    let mut stream = MedianStream::new(&config.window);
    let summary = pipeline::run(reader, writer, &mut stream)?;

    let stats = stream.stats();
    info!(
        lines = summary.lines,
        emitted = summary.emitted,
        malformed = summary.malformed,
        blank = summary.blank,
        inserted = stats.inserted,
        refreshed = stats.refreshed,
        late_dropped = stats.late_dropped,
        stale_duplicates = stats.stale_duplicates,
        evicted_edges = stats.evicted_edges,
        vertices = stream.graph().vertex_count(),
        edges = stream.graph().edge_count(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "rolling-median finished"
    );

    Ok(())
}

/// Split positional arguments into input and output paths.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(PathBuf, PathBuf), CliError> {
    let input = args.next().unwrap_or_else(|| DEFAULT_INPUT.to_owned());
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_owned());
    if let Some(extra) = args.next() {
        return Err(CliError::Usage(format!(
            "unexpected argument {extra:?}; expected rolling-median [INPUT] [OUTPUT]"
        )));
    }
    Ok((PathBuf::from(input), PathBuf::from(output)))
}

/// Open the input for reading and create the output for writing.
///
/// The input is opened first so a missing input never leaves an empty
/// output file behind.
fn open_streams(
    input: &Path,
    output: &Path,
) -> Result<(BufReader<File>, BufWriter<File>), CliError> {
    let reader = File::open(input).map_err(|source| CliError::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;
    let writer = create_output(output)?;
    Ok((BufReader::new(reader), BufWriter::new(writer)))
}

/// Create the output file, making its parent directory if needed.
fn create_output(path: &Path) -> Result<File, CliError> {
    let wrap = |source| CliError::CreateOutput {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    File::create(path).map_err(wrap)
}
