//! Conversion between wire timestamps and [`Epoch`] seconds.

use chrono::{DateTime, NaiveDateTime};

/// Whole seconds since the Unix epoch, UTC.
pub type Epoch = i64;

/// The wire layout of a payment timestamp, without the zone marker.
const TIMESTAMP_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors raised while converting timestamps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// The text is not a `yyyy-MM-ddTHH:mm:ss` date-time.
    #[error("unparsable timestamp {value:?}: {reason}")]
    Unparsable {
        /// The offending text, as received.
        value: String,
        /// What chrono rejected.
        reason: String,
    },

    /// The epoch value cannot be represented as a calendar date-time.
    #[error("epoch {0} is out of the representable date range")]
    OutOfRange(Epoch),
}

/// Parse a wire timestamp such as `2014-03-01T00:00:59Z` into epoch seconds.
///
/// The trailing `Z` zone marker is optional; the value is always read as
/// UTC. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`TimestampError::Unparsable`] if the text is not a date-time in
/// the expected layout.
pub fn parse_timestamp(value: &str) -> Result<Epoch, TimestampError> {
    let trimmed = value.trim();
    let bare = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(bare, TIMESTAMP_LAYOUT)
        .map(|naive| naive.and_utc().timestamp())
        .map_err(|e| TimestampError::Unparsable {
            value: value.to_owned(),
            reason: e.to_string(),
        })
}

/// Format epoch seconds in the wire layout, including the `Z` marker.
///
/// # Errors
///
/// Returns [`TimestampError::OutOfRange`] if `epoch` has no calendar
/// representation.
pub fn format_timestamp(epoch: Epoch) -> Result<String, TimestampError> {
    let at = DateTime::from_timestamp(epoch, 0).ok_or(TimestampError::OutOfRange(epoch))?;
    Ok(format!("{}Z", at.format(TIMESTAMP_LAYOUT)))
}
