//! Backing-store synchronisation contract.
//!
//! The fleet graph never talks to a database directly.  It consumes a
//! [`SyncAdapter`]: a full snapshot on (re)build, per-kind deltas after every
//! simulator tick, and kind-routed attribute writes from dispatch effects.
//! [`FleetStore`] extends the contract with the record-level operations the
//! simulator needs to perturb the fleet.
//!
//! # Transactions
//!
//! Writes belonging to one logical operation (one battery allocation, one
//! refill, one simulator tick) are bracketed by `begin` / `commit`.  A failed
//! commit leaves the store unchanged; the in-memory graph is *not* rolled
//! back and callers must resync from [`SyncAdapter::read_all`].

use thiserror::Error;

use fc_core::{NodeId, NodeKind};

use crate::node::{AttrChange, Node, Station, Vehicle};

// ── Records ───────────────────────────────────────────────────────────────────

/// A node as stored: its 32-bit store id plus the typed record.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id:   NodeId,
    pub node: Node,
}

impl NodeRecord {
    pub fn new(id: NodeId, node: Node) -> Self {
        Self { id, node }
    }
}

/// Undirected routing edge between two stations or parking sites.
///
/// Vehicle location edges are implied by [`Vehicle::site`] and never stored
/// as edge records.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub a:           NodeId,
    pub b:           NodeId,
    pub travel_time: f64,
}

/// Full topology as read from the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl Snapshot {
    pub fn count_of(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|r| r.node.kind() == kind).count()
    }
}

/// Net changes to one node kind since that kind was last read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delta {
    pub added:   Vec<NodeRecord>,
    pub removed: Vec<NodeId>,
    pub changed: Vec<NodeRecord>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

// ── Writers ───────────────────────────────────────────────────────────────────

/// Node kinds the store accepts attribute writes for.
///
/// Parking sites are immutable between regenerations, so they have no writer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    Station,
    Vehicle,
}

impl WriteTarget {
    pub fn for_kind(kind: NodeKind) -> Option<WriteTarget> {
        match kind {
            NodeKind::Station => Some(WriteTarget::Station),
            NodeKind::Vehicle => Some(WriteTarget::Vehicle),
            NodeKind::Parking => None,
        }
    }

    pub fn kind(self) -> NodeKind {
        match self {
            WriteTarget::Station => NodeKind::Station,
            WriteTarget::Vehicle => NodeKind::Vehicle,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SyncError {
    /// The record was removed from the store after the graph last read it.
    #[error("store no longer holds {0}")]
    StaleReference(NodeId),

    #[error("{id} is not a {expected}")]
    KindMismatch { id: NodeId, expected: NodeKind },

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("backing store error: {0}")]
    Backend(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

// ── Traits ────────────────────────────────────────────────────────────────────

/// Read/write interface to the backing store consumed by the fleet graph.
pub trait SyncAdapter {
    /// Full topology.  Also resets every per-kind delta journal.
    fn read_all(&mut self) -> SyncResult<Snapshot>;

    /// Net additions, removals and changes to `kind` since the last
    /// `read_delta(kind)` or `read_all`.
    fn read_delta(&mut self, kind: NodeKind) -> SyncResult<Delta>;

    /// Apply attribute changes to one record.
    ///
    /// Returns [`SyncError::StaleReference`] when `id` no longer exists.
    fn write(&mut self, target: WriteTarget, id: NodeId, changes: &[AttrChange]) -> SyncResult<()>;

    fn begin(&mut self) -> SyncResult<()>;
    fn commit(&mut self) -> SyncResult<()>;
    fn rollback(&mut self) -> SyncResult<()>;
}

/// Record-level store operations used by the fleet simulator.
///
/// Id lists are returned in ascending order so random selection over them is
/// reproducible.
pub trait FleetStore: SyncAdapter {
    fn vehicle_ids(&self) -> Vec<NodeId>;
    fn vehicle(&self, id: NodeId) -> Option<Vehicle>;
    fn parking_ids(&self) -> Vec<NodeId>;
    /// Stations currently in the `charging` state.
    fn charging_stations(&self) -> Vec<(NodeId, Station)>;

    /// Insert a new vehicle and return the id the store assigned it.
    fn insert_vehicle(&mut self, vehicle: Vehicle) -> SyncResult<NodeId>;
    fn delete_vehicle(&mut self, id: NodeId) -> SyncResult<()>;

    /// Wipe the store and load `snapshot` in its place.
    fn replace_all(&mut self, snapshot: Snapshot) -> SyncResult<()>;
}

/// Run `op` inside a store transaction: commit on success, roll back on
/// failure.  A failed rollback is logged; the original error is returned.
pub fn transact<A, T, E>(adapter: &mut A, op: impl FnOnce(&mut A) -> Result<T, E>) -> Result<T, E>
where
    A: SyncAdapter + ?Sized,
    E: From<SyncError>,
{
    adapter.begin()?;
    match op(adapter) {
        Ok(value) => {
            adapter.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = adapter.rollback() {
                log::warn!("rollback failed after aborted transaction: {rb}");
            }
            Err(e)
        }
    }
}
