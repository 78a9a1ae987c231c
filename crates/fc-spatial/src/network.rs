//! Travel network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Store ids are sparse 32-bit values, so every node is first given a dense
//! *slot*; given slot `s`, its outgoing edges occupy:
//!
//! ```text
//! edge_to[ node_out_start[s] .. node_out_start[s+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_travel`) are sorted by
//! source slot and indexed by `EdgeId`.  Iterating a node's outgoing edges is
//! a contiguous scan, which is what Dijkstra's inner loop wants.
//!
//! The network is immutable once built.  It only changes when the topology is
//! regenerated, at which point the whole fleet graph is rebuilt anyway.

use rustc_hash::FxHashMap;

use fc_core::{EdgeId, NodeId, Position};

use crate::{SpatialError, SpatialResult};

// ── TravelNetwork ─────────────────────────────────────────────────────────────

/// Undirected travel-time graph over stations and parking sites, stored as a
/// directed CSR (each undirected edge appears once per direction).
///
/// Do not construct directly; use [`TravelNetworkBuilder`].
pub struct TravelNetwork {
    // ── Node data (indexed by slot) ───────────────────────────────────────
    /// Store id of each slot.
    pub node_ids: Vec<NodeId>,

    /// Position of each slot.
    pub node_pos: Vec<Position>,

    /// Reverse lookup: store id → slot.
    slots: FxHashMap<NodeId, u32>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    /// Source slot of each edge, needed for path reconstruction.
    pub edge_from: Vec<u32>,

    /// Destination slot of each edge.
    pub edge_to: Vec<u32>,

    /// Travel time of each edge.  Non-negative and finite.
    pub edge_travel: Vec<f64>,
}

impl TravelNetwork {
    /// A network with no nodes or edges.  Every routing request against it
    /// fails with [`SpatialError::NodeNotFound`].
    pub fn empty() -> Self {
        Self {
            node_ids:       Vec::new(),
            node_pos:       Vec::new(),
            slots:          FxHashMap::default(),
            node_out_start: vec![0],
            edge_from:      Vec::new(),
            edge_to:        Vec::new(),
            edge_travel:    Vec::new(),
        }
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Number of *directed* edges (twice the number of undirected roads).
    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    // ── Id / slot mapping ─────────────────────────────────────────────────

    #[inline]
    pub fn slot(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).map(|&s| s as usize)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    #[inline]
    pub fn node_id(&self, slot: usize) -> NodeId {
        self.node_ids[slot]
    }

    pub fn position(&self, id: NodeId) -> Option<Position> {
        self.slot(id).map(|s| self.node_pos[s])
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// `EdgeId`s of all outgoing edges from `slot`.  No heap allocation.
    #[inline]
    pub fn out_edges(&self, slot: usize) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[slot] as usize;
        let end   = self.node_out_start[slot + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, slot: usize) -> usize {
        (self.node_out_start[slot + 1] - self.node_out_start[slot]) as usize
    }

    /// `(neighbour, travel_time)` pairs of `id`.  Empty for unknown ids.
    pub fn neighbors(&self, id: NodeId) -> Vec<(NodeId, f64)> {
        match self.slot(id) {
            None => Vec::new(),
            Some(s) => self
                .out_edges(s)
                .map(|e| (self.node_ids[self.edge_to[e.index()] as usize], self.edge_travel[e.index()]))
                .collect(),
        }
    }

    /// Travel time of the direct edge `a → b` (the cheapest one if several
    /// parallel edges exist).
    pub fn travel_time(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let (sa, sb) = (self.slot(a)?, self.slot(b)?);
        self.out_edges(sa)
            .filter(|e| self.edge_to[e.index()] as usize == sb)
            .map(|e| self.edge_travel[e.index()])
            .min_by(f64::total_cmp)
    }
}

// ── TravelNetworkBuilder ──────────────────────────────────────────────────────

/// Construct a [`TravelNetwork`] incrementally, then call [`build`](Self::build).
///
/// Nodes and edges may be added in any order; endpoints are resolved and
/// validated in `build()`.
///
/// # Example
///
/// ```
/// use fc_core::{NodeId, Position};
/// use fc_spatial::TravelNetworkBuilder;
///
/// let mut b = TravelNetworkBuilder::new();
/// b.add_node(NodeId(10), Position::new(0.0, 0.0));
/// b.add_node(NodeId(20), Position::new(3.0, 4.0));
/// b.add_road(NodeId(10), NodeId(20), 12.5);
/// let net = b.build().unwrap();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct TravelNetworkBuilder {
    nodes:     Vec<(NodeId, Position)>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:        NodeId,
    to:          NodeId,
    travel_time: f64,
}

impl TravelNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    pub fn add_node(&mut self, id: NodeId, pos: Position) {
        self.nodes.push((id, pos));
    }

    /// Add a **directed** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, travel_time: f64) {
        self.raw_edges.push(RawEdge { from, to, travel_time });
    }

    /// Add edges in **both directions**.  Travel edges are always undirected.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, travel_time: f64) {
        self.add_directed_edge(a, b, travel_time);
        self.add_directed_edge(b, a, travel_time);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`TravelNetwork`].
    ///
    /// Fails on duplicate node ids, on edges whose endpoints were never
    /// added, and on negative or non-finite travel times.
    pub fn build(self) -> SpatialResult<TravelNetwork> {
        let node_count = self.nodes.len();

        let mut slots = FxHashMap::with_capacity_and_hasher(node_count, Default::default());
        for (slot, &(id, _)) in self.nodes.iter().enumerate() {
            if slots.insert(id, slot as u32).is_some() {
                return Err(SpatialError::DuplicateNode(id));
            }
        }

        let mut resolved: Vec<(u32, u32, f64)> = Vec::with_capacity(self.raw_edges.len());
        for e in &self.raw_edges {
            if !e.travel_time.is_finite() || e.travel_time < 0.0 {
                return Err(SpatialError::InvalidTravelTime {
                    from:        e.from,
                    to:          e.to,
                    travel_time: e.travel_time,
                });
            }
            let from = *slots.get(&e.from).ok_or(SpatialError::NodeNotFound(e.from))?;
            let to   = *slots.get(&e.to).ok_or(SpatialError::NodeNotFound(e.to))?;
            resolved.push((from, to, e.travel_time));
        }

        // Stable sort keeps insertion order among a node's edges, so routing
        // explores neighbours in the order the store listed them.
        resolved.sort_by_key(|&(from, _, _)| from);

        let edge_from:   Vec<u32> = resolved.iter().map(|e| e.0).collect();
        let edge_to:     Vec<u32> = resolved.iter().map(|e| e.1).collect();
        let edge_travel: Vec<f64> = resolved.iter().map(|e| e.2).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for &(from, _, _) in &resolved {
            node_out_start[from as usize + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, resolved.len());

        let (node_ids, node_pos) = self.nodes.into_iter().unzip();

        Ok(TravelNetwork {
            node_ids,
            node_pos,
            slots,
            node_out_start,
            edge_from,
            edge_to,
            edge_travel,
        })
    }
}

impl Default for TravelNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
