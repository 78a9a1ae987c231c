//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! Dispatch policies call routing via the [`Router`] trait, so a policy can be
//! tested against a scripted router or swapped onto A* without touching the
//! fleet graph.  The default [`DijkstraRouter`] is exact for the network sizes
//! the simulator generates.
//!
//! # Arrival penalty
//!
//! A trip that ends in a recharge pays the destination station's remaining
//! charge time on top of the travel time.  The caller resolves that penalty
//! (it lives on the station record, not in the network) and passes it in;
//! the router adds it on the final edge only, so it never influences which
//! intermediate nodes are visited.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use fc_core::{EdgeId, NodeId};

use crate::network::TravelNetwork;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the visited nodes and the total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Nodes in travel order, starting at the source and ending at the
    /// destination.  A trivial route holds the source alone.
    pub nodes: Vec<NodeId>,
    /// Accumulated travel time plus any arrival penalty.
    pub cost: f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be `Send + Sync` so a session holding one can be
/// moved across threads by an embedding application.
pub trait Router: Send + Sync {
    /// Compute a least-cost route from `from` to `to`, adding
    /// `arrival_penalty` on arrival at `to`.
    ///
    /// `from == to` yields a trivial route whose cost is the penalty.
    fn route(
        &self,
        network: &TravelNetwork,
        from: NodeId,
        to: NodeId,
        arrival_penalty: f64,
    ) -> SpatialResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard single-pair Dijkstra over the CSR travel graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &TravelNetwork,
        from: NodeId,
        to: NodeId,
        arrival_penalty: f64,
    ) -> SpatialResult<Route> {
        dijkstra(network, from, to, arrival_penalty)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

fn dijkstra(
    network: &TravelNetwork,
    from: NodeId,
    to: NodeId,
    arrival_penalty: f64,
) -> SpatialResult<Route> {
    let src = network.slot(from).ok_or(SpatialError::NodeNotFound(from))?;
    let dst = network.slot(to).ok_or(SpatialError::NodeNotFound(to))?;

    if src == dst {
        return Ok(Route { nodes: vec![from], cost: arrival_penalty });
    }

    let n = network.node_count();
    // dist[s] = best known cost to reach slot s.
    let mut dist      = vec![f64::INFINITY; n];
    // prev_edge[s] = EdgeId that reached s; EdgeId::INVALID for unreached slots.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[src] = 0.0;

    // Min-heap keyed by (cost, slot).  The slot breaks ties deterministically.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, u32)>> = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), src as u32)));

    while let Some(Reverse((OrderedFloat(cost), slot))) = heap.pop() {
        let slot = slot as usize;
        if slot == dst {
            return Ok(reconstruct(network, &prev_edge, dst, cost));
        }

        // Skip stale heap entries.
        if cost > dist[slot] {
            continue;
        }

        for edge in network.out_edges(slot) {
            let neighbor = network.edge_to[edge.index()] as usize;
            let mut new_cost = cost + network.edge_travel[edge.index()];
            if neighbor == dst {
                new_cost += arrival_penalty;
            }

            if new_cost < dist[neighbor] {
                dist[neighbor] = new_cost;
                prev_edge[neighbor] = edge;
                heap.push(Reverse((OrderedFloat(new_cost), neighbor as u32)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(network: &TravelNetwork, prev_edge: &[EdgeId], dst: usize, cost: f64) -> Route {
    let mut nodes = vec![network.node_id(dst)];
    let mut cur = dst;
    loop {
        let e = prev_edge[cur];
        if e == EdgeId::INVALID {
            break;
        }
        cur = network.edge_from[e.index()] as usize;
        nodes.push(network.node_id(cur));
    }
    nodes.reverse();
    Route { nodes, cost }
}
