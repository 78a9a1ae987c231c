//! `fc-store`: in-memory backing store.
//!
//! [`MemoryStore`] implements the full [`SyncAdapter`] / [`FleetStore`]
//! contract without an external database, so sessions and tests run
//! self-contained.  Swapping in a database-backed store only requires
//! implementing the same two traits.
//!
//! # Change journals
//!
//! Each node kind has its own journal of ids added, removed and changed since
//! that kind was last read.  Journals hold *net* changes: a vehicle added and
//! removed between two reads does not appear at all, and a vehicle added then
//! modified appears only as added.
//!
//! # Transactions
//!
//! `begin` takes a savepoint of the whole store (records and journals);
//! `rollback` restores it, and `commit` discards it.  Transactions do not
//! nest.  Writes outside a transaction apply immediately.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use rustc_hash::FxHashMap;

use fc_core::{NodeId, NodeKind};
use fc_graph::{
    AttrChange, Delta, EdgeRecord, FleetStore, Node, NodeRecord, Snapshot, Station, SyncAdapter,
    SyncError, SyncResult, Vehicle, WriteTarget,
};


// ── Journal ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
struct Journal {
    added:   BTreeSet<NodeId>,
    removed: BTreeSet<NodeId>,
    changed: BTreeSet<NodeId>,
}

impl Journal {
    fn record_add(&mut self, id: NodeId) {
        if self.removed.remove(&id) {
            self.changed.insert(id);
        } else {
            self.added.insert(id);
        }
    }

    fn record_remove(&mut self, id: NodeId) {
        if !self.added.remove(&id) {
            self.changed.remove(&id);
            self.removed.insert(id);
        }
    }

    fn record_change(&mut self, id: NodeId) {
        if !self.added.contains(&id) {
            self.changed.insert(id);
        }
    }
}

// ── Store state ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
struct StoreState {
    nodes:    BTreeMap<NodeId, Node>,
    edges:    Vec<EdgeRecord>,
    journals: FxHashMap<NodeKind, Journal>,
    next_id:  u32,
}

impl StoreState {
    fn journal(&mut self, kind: NodeKind) -> &mut Journal {
        self.journals.entry(kind).or_default()
    }

    fn record(&self, id: NodeId) -> Option<NodeRecord> {
        self.nodes.get(&id).map(|n| NodeRecord::new(id, n.clone()))
    }

    fn is_parking(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(&id), Some(Node::Parking(_)))
    }
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    state:        StoreState,
    savepoint:    Option<StoreState>,
    fail_commits: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `snapshot`, with empty journals.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        store.load(snapshot);
        store
    }

    /// Make every subsequent `commit` fail and restore its savepoint.
    /// Used to exercise the transaction-failure path.
    pub fn fail_commits(&mut self, fail: bool) {
        self.fail_commits = fail;
    }

    pub fn in_transaction(&self) -> bool {
        self.savepoint.is_some()
    }

    pub fn len(&self) -> usize {
        self.state.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.state.nodes.get(&id)
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.state.edges
    }

    fn load(&mut self, snapshot: Snapshot) {
        let next_id = snapshot
            .nodes
            .iter()
            .map(|r| r.id.0.saturating_add(1))
            .max()
            .unwrap_or(0);
        self.state = StoreState {
            nodes:    snapshot.nodes.into_iter().map(|r| (r.id, r.node)).collect(),
            edges:    snapshot.edges,
            journals: FxHashMap::default(),
            next_id,
        };
    }

    fn ids_where(&self, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.state.nodes.iter().filter(|(_, n)| pred(n)).map(|(&id, _)| id).collect()
    }
}

// ── SyncAdapter ───────────────────────────────────────────────────────────────

impl SyncAdapter for MemoryStore {
    fn read_all(&mut self) -> SyncResult<Snapshot> {
        self.state.journals.clear();
        Ok(Snapshot {
            nodes: self.state.nodes.iter().map(|(&id, n)| NodeRecord::new(id, n.clone())).collect(),
            edges: self.state.edges.clone(),
        })
    }

    fn read_delta(&mut self, kind: NodeKind) -> SyncResult<Delta> {
        let journal = self.state.journals.remove(&kind).unwrap_or_default();
        Ok(Delta {
            added:   journal.added.iter().filter_map(|&id| self.state.record(id)).collect(),
            removed: journal.removed.into_iter().collect(),
            changed: journal.changed.iter().filter_map(|&id| self.state.record(id)).collect(),
        })
    }

    fn write(&mut self, target: WriteTarget, id: NodeId, changes: &[AttrChange]) -> SyncResult<()> {
        let kind = target.kind();
        let node = self.state.nodes.get(&id).ok_or(SyncError::StaleReference(id))?;
        if node.kind() != kind {
            return Err(SyncError::KindMismatch { id, expected: kind });
        }
        for &change in changes {
            if !change.applies_to(kind) {
                return Err(SyncError::KindMismatch { id, expected: kind });
            }
            if let AttrChange::Site(site) = change {
                if !self.state.is_parking(site) {
                    return Err(SyncError::KindMismatch { id: site, expected: NodeKind::Parking });
                }
            }
        }

        if let Some(node) = self.state.nodes.get_mut(&id) {
            for &change in changes {
                change.apply(node);
            }
        }
        self.state.journal(kind).record_change(id);
        Ok(())
    }

    fn begin(&mut self) -> SyncResult<()> {
        if self.savepoint.is_some() {
            return Err(SyncError::Transaction("transaction already open".into()));
        }
        self.savepoint = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> SyncResult<()> {
        let savepoint = self
            .savepoint
            .take()
            .ok_or_else(|| SyncError::Transaction("commit without open transaction".into()))?;
        if self.fail_commits {
            self.state = savepoint;
            debug!("commit rejected; store restored to savepoint");
            return Err(SyncError::Transaction("commit rejected by store".into()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> SyncResult<()> {
        let savepoint = self
            .savepoint
            .take()
            .ok_or_else(|| SyncError::Transaction("rollback without open transaction".into()))?;
        self.state = savepoint;
        debug!("transaction rolled back");
        Ok(())
    }
}

// ── FleetStore ────────────────────────────────────────────────────────────────

impl FleetStore for MemoryStore {
    fn vehicle_ids(&self) -> Vec<NodeId> {
        self.ids_where(|n| matches!(n, Node::Vehicle(_)))
    }

    fn vehicle(&self, id: NodeId) -> Option<Vehicle> {
        self.state.nodes.get(&id).and_then(Node::as_vehicle).cloned()
    }

    fn parking_ids(&self) -> Vec<NodeId> {
        self.ids_where(|n| matches!(n, Node::Parking(_)))
    }

    fn charging_stations(&self) -> Vec<(NodeId, Station)> {
        self.state
            .nodes
            .iter()
            .filter_map(|(&id, n)| n.as_station().map(|s| (id, s)))
            .filter(|(_, s)| s.status == fc_core::StationStatus::Charging)
            .map(|(id, s)| (id, s.clone()))
            .collect()
    }

    fn insert_vehicle(&mut self, vehicle: Vehicle) -> SyncResult<NodeId> {
        if !self.state.is_parking(vehicle.site) {
            return Err(SyncError::KindMismatch { id: vehicle.site, expected: NodeKind::Parking });
        }
        let id = NodeId(self.state.next_id);
        self.state.next_id = self
            .state
            .next_id
            .checked_add(1)
            .ok_or_else(|| SyncError::Backend("node id space exhausted".into()))?;
        self.state.nodes.insert(id, Node::Vehicle(vehicle));
        self.state.journal(NodeKind::Vehicle).record_add(id);
        Ok(id)
    }

    fn delete_vehicle(&mut self, id: NodeId) -> SyncResult<()> {
        match self.state.nodes.get(&id) {
            None => Err(SyncError::StaleReference(id)),
            Some(Node::Vehicle(_)) => {
                self.state.nodes.remove(&id);
                self.state.journal(NodeKind::Vehicle).record_remove(id);
                Ok(())
            }
            Some(_) => Err(SyncError::KindMismatch { id, expected: NodeKind::Vehicle }),
        }
    }

    fn replace_all(&mut self, snapshot: Snapshot) -> SyncResult<()> {
        debug!(
            "store replaced: {} nodes, {} edges",
            snapshot.nodes.len(),
            snapshot.edges.len(),
        );
        self.load(snapshot);
        Ok(())
    }
}
