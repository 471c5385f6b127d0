//! Line-oriented driver: one record in, one median out.

use std::io::{BufRead, Write};

use paygraph_core::MedianStream;
use tracing::warn;

use crate::error::CliError;

/// Line counts from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines read, including blank and malformed ones.
    pub lines: usize,
    /// Blank lines skipped.
    pub blank: usize,
    /// Malformed lines skipped.
    pub malformed: usize,
    /// Median lines written.
    pub emitted: usize,
}

/// Feed every line of `input` through `stream`, writing one median per
/// record to `output`.
///
/// Blank lines are skipped silently. Malformed lines are logged and skipped;
/// neither produces an output line.
///
/// # Errors
///
/// Returns [`CliError::Io`] on read or write failure and
/// [`CliError::Stream`] if the stream reports an unrecoverable error.
pub fn run<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    stream: &mut MedianStream,
) -> Result<RunSummary, CliError> {
    let mut summary = RunSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let number = index.saturating_add(1);
        summary.lines = number;

        if line.trim().is_empty() {
            summary.blank = summary.blank.saturating_add(1);
            continue;
        }

        match stream.process_line(&line) {
            Ok(emission) => {
                writeln!(output, "{}", emission.formatted())?;
                summary.emitted = summary.emitted.saturating_add(1);
            }
            Err(e) if e.is_recoverable() => {
                warn!(line = number, error = %e, "skipping malformed record");
                summary.malformed = summary.malformed.saturating_add(1);
            }
            Err(source) => {
                return Err(CliError::Stream {
                    line: number,
                    source,
                });
            }
        }
    }

    output.flush()?;
    Ok(summary)
}
