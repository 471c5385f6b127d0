//! Shared types for the paygraph rolling-median pipeline.
//!
//! Every crate in the workspace speaks in terms of [`Payment`]: one
//! timestamped payment between two actors. The parser produces them, the
//! stream controller consumes them, and the generator writes their wire
//! form ([`PaymentRecord`]).
//!
//! # Time
//!
//! Payment timestamps travel as ISO-8601 strings with a literal `Z`
//! suffix (`2014-03-01T00:00:59Z`) and are held in memory as whole
//! seconds since the Unix epoch ([`Epoch`]). The window arithmetic in
//! `paygraph-core` works exclusively on [`Epoch`] values.

pub mod payment;
pub mod time;

pub use payment::{Payment, PaymentRecord};
pub use time::{Epoch, TimestampError, format_timestamp, parse_timestamp};
