//! Per-event decision logic: the stream controller.
//!
//! [`MedianStream`] owns the window state (`max_epoch`) and the
//! [`WindowedGraph`]. Each payment goes through, in order:
//!
//! 1. **Late drop** -- older than the window: ignored.
//! 2. **Window advance** -- `max_epoch` moves forward, expired edges go.
//! 3. **Duplicate check** -- an existing edge for the pair is kept if it is
//!    at least as new, otherwise replaced.
//! 4. **Insertion** of the new edge.
//!
//! Every payment, accepted or not, yields an [`Emission`] carrying the
//! median after processing it.

use paygraph_types::{Epoch, Payment};
use tracing::debug;

use crate::config::WindowConfig;
use crate::graph::{GraphError, WindowedGraph};
use crate::median::MedianError;
use crate::parse::{MalformedRecord, parse_record};

/// Errors raised while processing a payment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The input line is not a valid record. Recoverable: skip the line.
    #[error("malformed record: {0}")]
    Record(#[from] MalformedRecord),

    /// The graph rejected an update. Indicates corrupted state.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

impl From<MedianError> for StreamError {
    fn from(source: MedianError) -> Self {
        Self::Graph(GraphError::Median(source))
    }
}

impl StreamError {
    /// Return whether processing can continue with the next line.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

/// What the controller did with one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new edge was added for a pair that had none.
    Inserted,
    /// The pair's older edge was replaced by this newer payment.
    Refreshed {
        /// Epoch of the replaced edge.
        previous: Epoch,
    },
    /// The payment predates the window and was ignored.
    LateDropped,
    /// The pair already has an edge at least as new; the payment was ignored.
    StaleDuplicate {
        /// Epoch of the edge that was kept.
        existing: Epoch,
    },
}

/// The result of processing one payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    /// What happened to the payment.
    pub outcome: Outcome,
    /// Median vertex degree after processing.
    pub median: f64,
}

impl Emission {
    /// The median as written to the output: two decimal places.
    pub fn formatted(&self) -> String {
        format!("{:.2}", self.median)
    }
}

/// Running counters over everything the controller has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Payments that created a new edge.
    pub inserted: u64,
    /// Payments that replaced an older edge for the same pair.
    pub refreshed: u64,
    /// Payments older than the window.
    pub late_dropped: u64,
    /// Payments no newer than the pair's existing edge.
    pub stale_duplicates: u64,
    /// Edges removed because the window moved past them.
    pub evicted_edges: u64,
}

impl StreamStats {
    /// Total payments processed.
    pub const fn processed(&self) -> u64 {
        self.inserted
            .saturating_add(self.refreshed)
            .saturating_add(self.late_dropped)
            .saturating_add(self.stale_duplicates)
    }

    fn record(&mut self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Inserted => &mut self.inserted,
            Outcome::Refreshed { .. } => &mut self.refreshed,
            Outcome::LateDropped => &mut self.late_dropped,
            Outcome::StaleDuplicate { .. } => &mut self.stale_duplicates,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Rolling median degree over a windowed payment graph.
///
/// Single writer: every method that changes state takes `&mut self`, so at
/// most one payment is ever in flight.
#[derive(Debug, Clone)]
pub struct MedianStream {
    graph: WindowedGraph,
    /// Largest accepted epoch; `None` until the first payment.
    max_epoch: Option<Epoch>,
    stats: StreamStats,
}

impl MedianStream {
    /// Create a controller with an empty graph.
    pub fn new(window: &WindowConfig) -> Self {
        Self {
            graph: WindowedGraph::new(window.span_seconds),
            max_epoch: None,
            stats: StreamStats::default(),
        }
    }

    /// Parse one input line and process the payment it holds.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Record`] if the line is malformed (state is
    /// untouched), or [`StreamError::Graph`] on internal inconsistency.
    pub fn process_line(&mut self, line: &str) -> Result<Emission, StreamError> {
        let payment = parse_record(line)?;
        self.process(&payment)
    }

    /// Process one payment and return the median that follows it.
    ///
    /// The first payment always opens the window, whatever its epoch.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Graph`] if the graph or degree structure
    /// detects an inconsistency, and [`StreamError::Record`] for a
    /// self-payment.
    pub fn process(&mut self, payment: &Payment) -> Result<Emission, StreamError> {
        if payment.actor == payment.target {
            return Err(MalformedRecord::SelfPayment(payment.actor.clone()).into());
        }

        let outcome = self.apply(payment)?;
        self.stats.record(outcome);
        let median = self.graph.median()?;

        debug!(
            epoch = payment.epoch,
            actor = %payment.actor,
            target = %payment.target,
            ?outcome,
            median,
            "processed payment"
        );
        Ok(Emission { outcome, median })
    }

    /// Current median degree.
    ///
    /// # Errors
    ///
    /// Returns [`MedianError::EmptyStructureQuery`] (wrapped) before the
    /// first payment.
    pub fn current_median(&self) -> Result<f64, StreamError> {
        Ok(self.graph.median()?)
    }

    /// Largest accepted epoch, if any payment has been accepted.
    pub const fn max_epoch(&self) -> Option<Epoch> {
        self.max_epoch
    }

    /// The graph as of the last processed payment.
    pub const fn graph(&self) -> &WindowedGraph {
        &self.graph
    }

    /// Counters over all processed payments.
    pub const fn stats(&self) -> &StreamStats {
        &self.stats
    }

    fn apply(&mut self, payment: &Payment) -> Result<Outcome, GraphError> {
        let epoch = payment.epoch;

        if let Some(max_epoch) = self.max_epoch
            && epoch < max_epoch.saturating_sub(self.graph.horizon())
        {
            return Ok(Outcome::LateDropped);
        }

        let max_epoch = self.max_epoch.map_or(epoch, |current| current.max(epoch));
        self.max_epoch = Some(max_epoch);
        let evicted = self.graph.evict_upto(max_epoch)?;
        self.stats.evicted_edges = self
            .stats
            .evicted_edges
            .saturating_add(u64::try_from(evicted).unwrap_or(u64::MAX));

        let mut outcome = Outcome::Inserted;
        if let Some(existing) = self.graph.edge_timestamp(&payment.actor, &payment.target) {
            if epoch <= existing {
                return Ok(Outcome::StaleDuplicate { existing });
            }
            self.graph.remove_edge(&payment.actor, &payment.target)?;
            outcome = Outcome::Refreshed { previous: existing };
        }

        self.graph.upsert_edge(&payment.actor, &payment.target, epoch)?;
        Ok(outcome)
    }
}

impl Default for MedianStream {
    fn default() -> Self {
        Self::new(&WindowConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pay(epoch: Epoch, actor: &str, target: &str) -> Payment {
        Payment::new(epoch, actor, target)
    }

    fn run(stream: &mut MedianStream, payments: &[Payment]) -> Vec<String> {
        payments
            .iter()
            .map(|p| {
                stream
                    .process(p)
                    .map_or_else(|e| format!("error: {e}"), |em| em.formatted())
            })
            .collect()
    }

    #[test]
    fn three_event_scenario() {
        let mut stream = MedianStream::default();
        let out = run(
            &mut stream,
            &[pay(59, "A", "B"), pay(65, "B", "C"), pay(120, "A", "C")],
        );
        assert_eq!(out, vec!["1.00", "1.00", "1.00"]);
        assert_eq!(stream.max_epoch(), Some(120));

        let g = stream.graph();
        assert_eq!(g.edge_timestamp("A", "B"), None);
        assert_eq!(g.edge_timestamp("B", "C"), Some(65));
        assert_eq!(g.edge_timestamp("A", "C"), Some(120));
        assert_eq!(g.degree("A"), Some(1));
        assert_eq!(g.degree("B"), Some(1));
        assert_eq!(g.degree("C"), Some(2));
        assert_eq!(stream.stats().evicted_edges, 1);
    }

    #[test]
    fn star_and_triangle_medians() {
        let mut stream = MedianStream::default();
        let out = run(
            &mut stream,
            &[
                pay(0, "hub", "a"),
                pay(1, "hub", "b"),
                pay(2, "c", "d"),
            ],
        );
        // {1,1} -> 1, {2,1,1} -> 1, {2,1,1,1,1} -> 1
        assert_eq!(out, vec!["1.00", "1.00", "1.00"]);

        let mut stream = MedianStream::default();
        let out = run(
            &mut stream,
            &[pay(0, "a", "b"), pay(1, "b", "c"), pay(2, "c", "a"), pay(3, "a", "d")],
        );
        // {1,1}, {1,2,1}, {2,2,2}, {3,2,2,1}
        assert_eq!(out, vec!["1.00", "1.00", "2.00", "2.00"]);
    }

    #[test]
    fn even_count_median_has_half_value() {
        let mut stream = MedianStream::default();
        let out = run(
            &mut stream,
            &[pay(0, "a", "b"), pay(1, "b", "c"), pay(2, "c", "d")],
        );
        // {1,1}, {1,2,1}, {1,2,2,1}
        assert_eq!(out, vec!["1.00", "1.00", "1.50"]);

        let out = run(&mut stream, &[pay(3, "d", "a")]);
        // a 4-cycle: every degree is 2
        assert_eq!(out, vec!["2.00"]);
    }

    #[test]
    fn late_payment_changes_nothing() {
        let mut stream = MedianStream::default();
        let before = run(&mut stream, &[pay(100, "a", "b"), pay(100, "b", "c")]);
        let snapshot = stream.graph().clone();

        let emission = stream.process(&pay(40, "x", "y"));
        assert_eq!(
            emission.as_ref().map(|e| e.outcome),
            Ok(Outcome::LateDropped)
        );
        assert_eq!(Some(&emission.unwrap().formatted()), before.last());
        assert_eq!(stream.graph(), &snapshot);
        assert_eq!(stream.max_epoch(), Some(100));
    }

    #[test]
    fn boundary_payment_is_accepted_but_evicted_later() {
        let mut stream = MedianStream::default();
        assert!(stream.process(&pay(100, "a", "b")).is_ok());
        // 41 == 100 - 59: exactly on the boundary, not late.
        let emission = stream.process(&pay(41, "c", "d"));
        assert_eq!(emission.map(|e| e.outcome), Ok(Outcome::Inserted));
        assert_eq!(stream.graph().edge_timestamp("c", "d"), Some(41));
        assert_eq!(stream.graph().edge_count(), 2);

        assert!(stream.process(&pay(101, "e", "f")).is_ok());
        assert_eq!(stream.graph().edge_timestamp("c", "d"), None);
    }

    #[test]
    fn newer_payment_refreshes_pair() {
        let mut stream = MedianStream::default();
        assert!(stream.process(&pay(10, "a", "b")).is_ok());
        let emission = stream.process(&pay(20, "b", "a"));
        assert_eq!(
            emission.map(|e| e.outcome),
            Ok(Outcome::Refreshed { previous: 10 })
        );
        assert_eq!(stream.graph().edge_count(), 1);
        assert_eq!(stream.graph().bucket_count(), 1);
        assert_eq!(stream.graph().edge_timestamp("a", "b"), Some(20));

        let snapshot = stream.graph().clone();
        let emission = stream.process(&pay(10, "a", "b"));
        assert_eq!(
            emission.map(|e| e.outcome),
            Ok(Outcome::StaleDuplicate { existing: 20 })
        );
        assert_eq!(stream.graph(), &snapshot);

        // The refreshed edge outlives its first epoch.
        assert!(stream.process(&pay(75, "c", "d")).is_ok());
        assert_eq!(stream.graph().edge_timestamp("a", "b"), Some(20));
    }

    #[test]
    fn equal_timestamp_duplicate_is_dropped() {
        let mut stream = MedianStream::default();
        assert!(stream.process(&pay(10, "a", "b")).is_ok());
        let emission = stream.process(&pay(10, "a", "b"));
        assert_eq!(
            emission.map(|e| e.outcome),
            Ok(Outcome::StaleDuplicate { existing: 10 })
        );
    }

    #[test]
    fn large_jump_empties_the_window() {
        let mut stream = MedianStream::default();
        let _ = run(
            &mut stream,
            &[pay(0, "a", "b"), pay(1, "a", "c"), pay(2, "a", "d"), pay(3, "c", "d")],
        );
        let emission = stream.process(&pay(10_000, "y", "z"));
        assert_eq!(emission.unwrap().formatted(), "1.00");
        assert_eq!(stream.graph().vertex_count(), 2);
        assert_eq!(stream.graph().edge_count(), 1);
        assert_eq!(stream.stats().evicted_edges, 4);
    }

    #[test]
    fn first_payment_opens_window_at_any_epoch() {
        let mut stream = MedianStream::default();
        assert_eq!(stream.max_epoch(), None);
        let emission = stream.process(&pay(-5_000, "a", "b"));
        assert_eq!(emission.map(|e| e.outcome), Ok(Outcome::Inserted));
        assert_eq!(stream.max_epoch(), Some(-5_000));
    }

    #[test]
    fn older_in_window_payment_keeps_max_epoch() {
        let mut stream = MedianStream::default();
        assert!(stream.process(&pay(100, "a", "b")).is_ok());
        assert!(stream.process(&pay(80, "c", "d")).is_ok());
        assert_eq!(stream.max_epoch(), Some(100));
        assert_eq!(stream.graph().edge_timestamp("c", "d"), Some(80));
    }

    #[test]
    fn malformed_line_leaves_state_untouched() {
        let mut stream = MedianStream::default();
        let result = stream.process_line("{\"actor\": \"a\"}");
        assert!(result.as_ref().is_err_and(StreamError::is_recoverable));
        assert_eq!(stream.max_epoch(), None);
        assert_eq!(stream.stats().processed(), 0);
    }

    #[test]
    fn process_line_parses_and_applies() {
        let mut stream = MedianStream::default();
        let line = r#"{"created_time": "2014-03-01T00:00:59Z", "target": "b", "actor": "a"}"#;
        let emission = stream.process_line(line);
        assert_eq!(emission.unwrap().formatted(), "1.00");
        assert_eq!(stream.max_epoch(), Some(1_393_632_059));
    }

    #[test]
    fn self_payment_is_rejected() {
        let mut stream = MedianStream::default();
        assert_eq!(
            stream.process(&pay(1, "a", "a")),
            Err(StreamError::Record(MalformedRecord::SelfPayment("a".to_owned())))
        );
        assert_eq!(
            stream.current_median(),
            Err(StreamError::Graph(GraphError::Median(
                MedianError::EmptyStructureQuery
            )))
        );
    }

    #[test]
    fn stats_count_every_outcome() {
        let mut stream = MedianStream::default();
        let _ = run(
            &mut stream,
            &[
                pay(100, "a", "b"),
                pay(100, "a", "b"),
                pay(101, "a", "b"),
                pay(10, "c", "d"),
                pay(102, "c", "d"),
            ],
        );
        assert_eq!(
            *stream.stats(),
            StreamStats {
                inserted: 2,
                refreshed: 1,
                late_dropped: 1,
                stale_duplicates: 1,
                evicted_edges: 0,
            }
        );
        assert_eq!(stream.stats().processed(), 5);
    }

    #[test]
    fn wider_window_keeps_more_edges() {
        let mut stream = MedianStream::new(&WindowConfig { span_seconds: 120 });
        let _ = run(&mut stream, &[pay(0, "a", "b"), pay(100, "c", "d")]);
        assert_eq!(stream.graph().edge_count(), 2);
        // 100 - 119 = -19 is the oldest epoch still inside the window.
        assert!(stream.process(&pay(-19, "e", "f")).is_ok());
        let emission = stream.process(&pay(-20, "g", "h"));
        assert_eq!(emission.map(|e| e.outcome), Ok(Outcome::LateDropped));
    }
}
