//! Rolling median of vertex degree over a windowed payment graph.
//!
//! Payments arrive as text records, one per line. Each one adds (or
//! refreshes) an undirected edge between its two actors; edges older than
//! the trailing window are evicted. After every record the median degree
//! of the remaining graph is reported.
//!
//! # Modules
//!
//! - [`parse`] -- Tolerant record scanner producing [`Payment`] values.
//! - [`median`] -- [`DegreeMedian`], a two-half order-statistics multiset.
//! - [`graph`] -- [`WindowedGraph`], vertices, edges and epoch buckets.
//! - [`stream`] -- [`MedianStream`], the per-payment state machine.
//! - [`config`] -- Optional YAML configuration.
//!
//! # Usage
//!
//! ```
//! use paygraph_core::MedianStream;
//!
//! let mut stream = MedianStream::default();
//! let lines = [
//!     r#"{"created_time": "2014-03-01T00:00:59Z", "target": "B", "actor": "A"}"#,
//!     r#"{"created_time": "2014-03-01T00:01:05Z", "target": "C", "actor": "B"}"#,
//!     r#"{"created_time": "2014-03-01T00:02:00Z", "target": "C", "actor": "A"}"#,
//! ];
//! let medians: Vec<String> = lines
//!     .iter()
//!     .filter_map(|line| stream.process_line(line).ok())
//!     .map(|emission| emission.formatted())
//!     .collect();
//! assert_eq!(medians, ["1.00", "1.00", "1.00"]);
//! ```
//!
//! [`Payment`]: paygraph_types::Payment
//! [`DegreeMedian`]: median::DegreeMedian
//! [`WindowedGraph`]: graph::WindowedGraph

pub mod config;
pub mod graph;
pub mod median;
pub mod parse;
pub mod stream;

pub use config::{ConfigError, PaygraphConfig, WindowConfig};
pub use stream::{Emission, MedianStream, Outcome, StreamError, StreamStats};
