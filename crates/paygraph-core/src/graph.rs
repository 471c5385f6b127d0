//! Payment graph restricted to a trailing time window.
//!
//! The graph stores at most one edge per unordered actor pair, tagged with
//! the epoch of the payment that created or last refreshed it. Edges are
//! indexed twice:
//!
//! - per vertex, as a neighbor map `neighbor id -> edge epoch`, so degree is
//!   the neighbor map's length;
//! - per epoch, in a bucket of edge keys, so eviction pops whole buckets off
//!   the front of an ordered map.
//!
//! The graph owns the [`DegreeMedian`] and updates it on every degree
//! change. After any public method returns, the degree multiset equals the
//! degrees found by walking the vertices.

use std::collections::{BTreeMap, BTreeSet};

use paygraph_types::Epoch;
use tracing::{debug, trace};

use crate::median::{DegreeMedian, MedianError};

/// Errors raised by [`WindowedGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The degree structure rejected an update.
    #[error("degree structure error: {0}")]
    Median(#[from] MedianError),

    /// An edge from a vertex to itself was requested.
    #[error("self-loop on vertex {0:?}")]
    SelfLoop(String),

    /// An edge was inserted for a pair that already has one.
    #[error("edge {0} already exists")]
    EdgeExists(EdgeKey),

    /// An edge known to a bucket is missing from a vertex, or vice versa.
    #[error("edge {0} is not linked in the graph")]
    DanglingEdge(EdgeKey),

    /// A vertex has more neighbors than the degree type can count.
    #[error("degree of vertex {0:?} exceeds u32")]
    DegreeOverflow(String),
}

/// Unordered pair of vertex ids, stored in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    first: String,
    second: String,
}

impl EdgeKey {
    /// Build the key for the pair `a`-`b`, regardless of direction.
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_owned(),
            second: second.to_owned(),
        }
    }

    /// Both endpoints, smaller id first.
    pub fn endpoints(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }
}

impl core::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// A vertex and its active neighbors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Vertex {
    /// Neighbor id -> epoch of the shared edge.
    neighbors: BTreeMap<String, Epoch>,
}

impl Vertex {
    fn degree(&self, id: &str) -> Result<u32, GraphError> {
        u32::try_from(self.neighbors.len())
            .map_err(|_err| GraphError::DegreeOverflow(id.to_owned()))
    }
}

/// Vertices and edges inside the trailing window, plus their degree median.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowedGraph {
    /// Vertex id -> vertex. A vertex exists iff it has at least one edge.
    vertices: BTreeMap<String, Vertex>,
    /// Edge epoch -> edges created at exactly that epoch.
    buckets: BTreeMap<Epoch, BTreeSet<EdgeKey>>,
    /// Multiset of the current vertex degrees.
    degrees: DegreeMedian,
    /// Largest allowed `max_epoch - edge_epoch` for a surviving edge.
    horizon: Epoch,
}

impl WindowedGraph {
    /// Create an empty graph whose window spans `span` seconds.
    ///
    /// An edge survives while `max_epoch - epoch <= span - 1`. Spans below
    /// one second are treated as one second.
    pub fn new(span: Epoch) -> Self {
        Self {
            vertices: BTreeMap::new(),
            buckets: BTreeMap::new(),
            degrees: DegreeMedian::new(),
            horizon: span.saturating_sub(1).max(0),
        }
    }

    /// Largest `max_epoch - epoch` distance an edge may have and survive.
    pub const fn horizon(&self) -> Epoch {
        self.horizon
    }

    /// Return whether an edge at `epoch` lies inside the window ending at
    /// `max_epoch`.
    pub const fn in_window(&self, epoch: Epoch, max_epoch: Epoch) -> bool {
        max_epoch.saturating_sub(epoch) <= self.horizon
    }

    /// Remove every edge that has fallen out of the window ending at
    /// `max_epoch`, oldest bucket first. Returns the number of edges removed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if a bucket references an edge the vertices
    /// do not know, which indicates corrupted state.
    pub fn evict_upto(&mut self, max_epoch: Epoch) -> Result<usize, GraphError> {
        let mut evicted: usize = 0;
        while let Some((&epoch, _)) = self.buckets.first_key_value() {
            if self.in_window(epoch, max_epoch) {
                break;
            }
            let edges = self.buckets.remove(&epoch).unwrap_or_default();
            for key in &edges {
                self.detach(key)?;
            }
            evicted = evicted.saturating_add(edges.len());
            debug!(epoch, max_epoch, edges = edges.len(), "evicted expired bucket");
        }
        Ok(evicted)
    }

    /// Insert a fresh edge between `actor` and `target` tagged `epoch`.
    ///
    /// Both endpoints have their old degree withdrawn from the median
    /// structure before the edge is linked and their new degree recorded
    /// after. Vertices are created on demand.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SelfLoop`] if `actor == target` and
    /// [`GraphError::EdgeExists`] if the pair already has an edge; the
    /// caller must remove the old edge first.
    pub fn upsert_edge(
        &mut self,
        actor: &str,
        target: &str,
        epoch: Epoch,
    ) -> Result<(), GraphError> {
        if actor == target {
            return Err(GraphError::SelfLoop(actor.to_owned()));
        }
        let key = EdgeKey::new(actor, target);
        if self.edge_timestamp(actor, target).is_some() {
            return Err(GraphError::EdgeExists(key));
        }

        for id in [actor, target] {
            match self.vertices.get(id) {
                Some(vertex) => self.degrees.remove(vertex.degree(id)?)?,
                None => {
                    self.vertices.insert(id.to_owned(), Vertex::default());
                }
            }
        }

        for (id, other) in [(actor, target), (target, actor)] {
            if let Some(vertex) = self.vertices.get_mut(id) {
                vertex.neighbors.insert(other.to_owned(), epoch);
                self.degrees.insert(vertex.degree(id)?)?;
            }
        }

        trace!(edge = %key, epoch, "linked edge");
        self.buckets.entry(epoch).or_default().insert(key);
        Ok(())
    }

    /// Remove the edge between `actor` and `target`, if any, returning its
    /// epoch.
    ///
    /// Endpoints left without neighbors are deleted; the others have their
    /// degree moved down by one in the median structure.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingEdge`] if the edge is linked on the
    /// vertices but missing from its bucket.
    pub fn remove_edge(&mut self, actor: &str, target: &str) -> Result<Option<Epoch>, GraphError> {
        let Some(epoch) = self.edge_timestamp(actor, target) else {
            return Ok(None);
        };
        let key = EdgeKey::new(actor, target);

        let bucket = self
            .buckets
            .get_mut(&epoch)
            .ok_or_else(|| GraphError::DanglingEdge(key.clone()))?;
        if !bucket.remove(&key) {
            return Err(GraphError::DanglingEdge(key));
        }
        if bucket.is_empty() {
            self.buckets.remove(&epoch);
        }

        self.detach(&key)?;
        Ok(Some(epoch))
    }

    /// Epoch of the active edge between `a` and `b`, if one exists.
    pub fn edge_timestamp(&self, a: &str, b: &str) -> Option<Epoch> {
        self.vertices.get(a)?.neighbors.get(b).copied()
    }

    /// Number of active neighbors of `id`, or `None` if it is not a vertex.
    pub fn degree(&self, id: &str) -> Option<usize> {
        self.vertices.get(id).map(|v| v.neighbors.len())
    }

    /// Number of active vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of active edges.
    pub fn edge_count(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }

    /// Number of non-empty epoch buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Return whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Active edges with their epochs, oldest bucket first.
    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, Epoch)> + '_ {
        self.buckets
            .iter()
            .flat_map(|(epoch, keys)| keys.iter().map(move |key| (key, *epoch)))
    }

    /// Degree -> vertex count, computed by walking the vertices.
    pub fn degree_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for vertex in self.vertices.values() {
            let slot = counts.entry(vertex.neighbors.len()).or_insert(0_usize);
            *slot = slot.saturating_add(1);
        }
        counts
    }

    /// The degree multiset maintained alongside the vertices.
    pub const fn degrees(&self) -> &DegreeMedian {
        &self.degrees
    }

    /// Current median vertex degree.
    ///
    /// # Errors
    ///
    /// Returns [`MedianError::EmptyStructureQuery`] if the graph is empty.
    pub fn median(&self) -> Result<f64, MedianError> {
        self.degrees.median()
    }

    /// Unlink both endpoints of `key`. The bucket entry is the caller's job.
    fn detach(&mut self, key: &EdgeKey) -> Result<(), GraphError> {
        let (a, b) = key.endpoints();
        self.unlink(a, b, key)?;
        self.unlink(b, a, key)
    }

    /// Drop `neighbor` from `id`'s neighbor map, keeping the degree
    /// multiset in step. Deletes `id` when its last neighbor goes.
    fn unlink(&mut self, id: &str, neighbor: &str, key: &EdgeKey) -> Result<(), GraphError> {
        let vertex = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| GraphError::DanglingEdge(key.clone()))?;
        if !vertex.neighbors.contains_key(neighbor) {
            return Err(GraphError::DanglingEdge(key.clone()));
        }

        self.degrees.remove(vertex.degree(id)?)?;
        vertex.neighbors.remove(neighbor);
        if vertex.neighbors.is_empty() {
            self.vertices.remove(id);
        } else {
            self.degrees.insert(vertex.degree(id)?)?;
        }
        Ok(())
    }
}

impl Default for WindowedGraph {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_WINDOW_SPAN)
    }
}
