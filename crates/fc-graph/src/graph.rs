//! In-memory fleet topology.
//!
//! `FleetGraph` owns every node record of one session plus the travel network
//! over stations and parking sites.  Vehicles hang off parking sites through
//! a site → vehicles index rather than edges, so the "exactly one location
//! edge per vehicle" invariant holds by construction.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use rustc_hash::FxHashMap;

use fc_core::{NodeId, NodeKind, Position};
use fc_spatial::{Route, Router, TravelNetwork, TravelNetworkBuilder};

use crate::node::{AttrChange, Node, Station, Vehicle};
use crate::sync::{Delta, Snapshot, SyncAdapter, SyncError, WriteTarget};
use crate::{GraphError, GraphResult};

/// Mean charge reported for a site or fleet with no vehicles.
pub const FULL_CHARGE: f64 = 100.0;

// ── Renderer views ────────────────────────────────────────────────────────────

/// Per-site aggregate for renderers and output writers.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteSummary {
    pub id:            NodeId,
    pub name:          String,
    pub position:      Position,
    pub capacity:      u32,
    pub vehicle_count: usize,
    /// `FULL_CHARGE` when the site is empty.
    pub mean_charge:   f64,
}

/// One traversed edge of a route.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RouteEdge {
    pub from:        NodeId,
    pub to:          NodeId,
    pub travel_time: f64,
}

/// Counts of records applied by [`FleetGraph::reconcile`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added:   usize,
    pub removed: usize,
    pub changed: usize,
    /// A station was added or removed; the travel network is out of date
    /// until the graph is rebuilt from a full snapshot.
    pub needs_resync: bool,
}

// ── FleetGraph ────────────────────────────────────────────────────────────────

pub struct FleetGraph {
    nodes:         BTreeMap<NodeId, Node>,
    network:       TravelNetwork,
    /// Every parking site has an entry, possibly empty.
    site_vehicles: FxHashMap<NodeId, BTreeSet<NodeId>>,
}

impl FleetGraph {
    pub fn empty() -> Self {
        Self {
            nodes:         BTreeMap::new(),
            network:       TravelNetwork::empty(),
            site_vehicles: FxHashMap::default(),
        }
    }

    /// Build the graph from a full store snapshot.
    ///
    /// Fails on duplicate ids, on vehicles whose site is not a parking site,
    /// and on routing edges that touch a vehicle or an unknown id.
    pub fn from_snapshot(snapshot: Snapshot) -> GraphResult<Self> {
        let mut nodes = BTreeMap::new();
        for record in snapshot.nodes {
            let id = record.id;
            if nodes.insert(id, record.node).is_some() {
                return Err(GraphError::DuplicateNode(id));
            }
        }

        let mut builder = TravelNetworkBuilder::with_capacity(nodes.len(), snapshot.edges.len() * 2);
        let mut site_vehicles: FxHashMap<NodeId, BTreeSet<NodeId>> = FxHashMap::default();
        for (&id, node) in &nodes {
            match node {
                Node::Station(s) => builder.add_node(id, s.position),
                Node::Parking(p) => {
                    builder.add_node(id, p.position);
                    site_vehicles.entry(id).or_default();
                }
                Node::Vehicle(_) => {}
            }
        }

        for (&id, node) in &nodes {
            if let Node::Vehicle(v) = node {
                if !matches!(nodes.get(&v.site), Some(Node::Parking(_))) {
                    return Err(GraphError::DanglingVehicle { vehicle: id, site: v.site });
                }
                site_vehicles.entry(v.site).or_default().insert(id);
            }
        }

        for edge in &snapshot.edges {
            let routable = |id: NodeId| nodes.get(&id).is_some_and(|n| n.kind().is_routable());
            if !routable(edge.a) || !routable(edge.b) {
                return Err(GraphError::NonRoutableEdge { a: edge.a, b: edge.b });
            }
            builder.add_road(edge.a, edge.b, edge.travel_time);
        }

        let network = builder.build()?;
        debug!(
            "fleet graph built: {} nodes, {} routing edges, {} sites",
            nodes.len(),
            network.edge_count() / 2,
            site_vehicles.len(),
        );

        Ok(Self { nodes, network, site_vehicles })
    }

    /// Read a full snapshot from `adapter` and build from it.
    pub fn load<A: SyncAdapter + ?Sized>(adapter: &mut A) -> GraphResult<Self> {
        let snapshot = adapter.read_all()?;
        Self::from_snapshot(snapshot)
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn station(&self, id: NodeId) -> Option<&Station> {
        self.nodes.get(&id).and_then(Node::as_station)
    }

    pub fn vehicle(&self, id: NodeId) -> Option<&Vehicle> {
        self.nodes.get(&id).and_then(Node::as_vehicle)
    }

    pub fn network(&self) -> &TravelNetwork {
        &self.network
    }

    /// Stations in ascending id order.
    pub fn stations(&self) -> impl Iterator<Item = (NodeId, &Station)> + '_ {
        self.nodes.iter().filter_map(|(&id, n)| n.as_station().map(|s| (id, s)))
    }

    /// Vehicles in ascending id order.
    pub fn vehicles(&self) -> impl Iterator<Item = (NodeId, &Vehicle)> + '_ {
        self.nodes.iter().filter_map(|(&id, n)| n.as_vehicle().map(|v| (id, v)))
    }

    pub fn vehicles_at(&self, site: NodeId) -> Vec<NodeId> {
        self.site_vehicles
            .get(&site)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn vehicle_count(&self) -> usize {
        self.site_vehicles.values().map(BTreeSet::len).sum()
    }

    /// Largest station capacity; bounds the agent's inventory.
    pub fn max_station_capacity(&self) -> u32 {
        self.stations().map(|(_, s)| s.capacity).max().unwrap_or(0)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn nodes_of_kind(&self, kind: NodeKind) -> BTreeSet<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind() == kind)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Ready stations in ascending id order.
    pub fn available_stations(&self) -> Vec<NodeId> {
        self.stations().filter(|(_, s)| s.is_ready()).map(|(id, _)| id).collect()
    }

    /// Mean charge of the vehicles at `site`, `None` if it has none.
    pub fn site_mean_charge(&self, site: NodeId) -> Option<f64> {
        self.site_vehicles.get(&site).and_then(|set| self.mean_charge_of(set))
    }

    /// Parking sites whose mean vehicle charge is below `threshold`.
    ///
    /// Sites without vehicles are never returned.  Ordered by vehicle count
    /// descending, then mean charge ascending, then id ascending.
    pub fn low_charge_sites(&self, threshold: f64) -> Vec<NodeId> {
        let mut rows: Vec<(usize, f64, NodeId)> = self
            .site_vehicles
            .iter()
            .filter_map(|(&site, set)| {
                let mean = self.mean_charge_of(set)?;
                (mean < threshold).then_some((set.len(), mean, site))
            })
            .collect();

        rows.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.total_cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        rows.into_iter().map(|(_, _, site)| site).collect()
    }

    /// Vehicles at `site` with charge strictly below `threshold`, neediest
    /// first.  Equal charges keep ascending id order.
    pub fn vehicles_below(&self, site: NodeId, threshold: f64) -> Vec<(NodeId, f64)> {
        let Some(set) = self.site_vehicles.get(&site) else {
            return Vec::new();
        };
        let mut below: Vec<(NodeId, f64)> = set
            .iter()
            .filter_map(|&id| self.vehicle(id).map(|v| (id, v.charge)))
            .filter(|&(_, charge)| charge < threshold)
            .collect();
        below.sort_by(|a, b| a.1.total_cmp(&b.1));
        below
    }

    /// Fleet-wide vehicles with charge strictly below `threshold`.
    pub fn count_vehicles_below(&self, threshold: f64) -> usize {
        self.vehicles().filter(|(_, v)| v.charge < threshold).count()
    }

    /// Mean charge over all vehicles; exactly [`FULL_CHARGE`] for an empty
    /// fleet.
    pub fn average_charge(&self) -> f64 {
        let (sum, count) = self
            .vehicles()
            .fold((0.0, 0usize), |(sum, count), (_, v)| (sum + v.charge, count + 1));
        if count == 0 { FULL_CHARGE } else { sum / count as f64 }
    }

    fn mean_charge_of(&self, set: &BTreeSet<NodeId>) -> Option<f64> {
        if set.is_empty() {
            return None;
        }
        let sum: f64 = set.iter().filter_map(|&id| self.vehicle(id)).map(|v| v.charge).sum();
        Some(sum / set.len() as f64)
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Least-cost route between two stations or parking sites.
    ///
    /// When `to_charge` is set and `to` is a station, the station's remaining
    /// charge time is added on arrival.
    pub fn route<R: Router + ?Sized>(
        &self,
        router: &R,
        from: NodeId,
        to: NodeId,
        to_charge: bool,
    ) -> GraphResult<Route> {
        for id in [from, to] {
            let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
            if !node.kind().is_routable() {
                return Err(GraphError::NotRoutable(id));
            }
        }
        let penalty = match self.station(to) {
            Some(station) if to_charge => f64::from(station.time_remaining),
            _ => 0.0,
        };
        Ok(router.route(&self.network, from, to, penalty)?)
    }

    /// Edges traversed along `path`, with their travel times.  Pairs with no
    /// direct edge are skipped.
    pub fn route_edges(&self, path: &[NodeId]) -> Vec<RouteEdge> {
        path
            .windows(2)
            .filter_map(|w| {
                let travel_time = self.network.travel_time(w[0], w[1])?;
                Some(RouteEdge { from: w[0], to: w[1], travel_time })
            })
            .collect()
    }

    /// One summary per parking site, ascending id.
    pub fn site_summaries(&self) -> Vec<SiteSummary> {
        self.nodes
            .iter()
            .filter_map(|(&id, n)| n.as_parking().map(|p| (id, p)))
            .map(|(id, p)| {
                let set = self.site_vehicles.get(&id);
                SiteSummary {
                    id,
                    name:          p.name.clone(),
                    position:      p.position,
                    capacity:      p.capacity,
                    vehicle_count: set.map_or(0, BTreeSet::len),
                    mean_charge:   set.and_then(|s| self.mean_charge_of(s)).unwrap_or(FULL_CHARGE),
                }
            })
            .collect()
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Apply `changes` to node `id` in memory, then forward them to the
    /// store writer for the node's kind.
    ///
    /// Every change is validated before anything is mutated.  A store that
    /// no longer holds the record is logged and otherwise ignored.
    pub fn update_attributes<A: SyncAdapter + ?Sized>(
        &mut self,
        id: NodeId,
        changes: &[AttrChange],
        adapter: &mut A,
    ) -> GraphResult<()> {
        let kind = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?.kind();
        let target = WriteTarget::for_kind(kind).ok_or(GraphError::UnknownNodeKind { id, kind })?;

        for &change in changes {
            if !change.applies_to(kind) {
                return Err(GraphError::AttributeMismatch { id, kind, attribute: change.name() });
            }
            if let AttrChange::Site(site) = change {
                if !matches!(self.nodes.get(&site), Some(Node::Parking(_))) {
                    return Err(GraphError::DanglingVehicle { vehicle: id, site });
                }
            }
        }

        self.apply_local(id, changes);

        match adapter.write(target, id, changes) {
            Ok(()) => Ok(()),
            Err(SyncError::StaleReference(stale)) => {
                warn!("skipping write to {stale}: record no longer in store");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn apply_local(&mut self, id: NodeId, changes: &[AttrChange]) {
        let Some(node) = self.nodes.get_mut(&id) else { return };
        let old_site = node.as_vehicle().map(|v| v.site);
        for &change in changes {
            change.apply(node);
        }
        let new_site = node.as_vehicle().map(|v| v.site);

        if old_site != new_site {
            if let Some(old) = old_site {
                if let Some(set) = self.site_vehicles.get_mut(&old) {
                    set.remove(&id);
                }
            }
            if let Some(new) = new_site {
                self.site_vehicles.entry(new).or_default().insert(id);
            }
        }
    }

    // ── Synchronisation ───────────────────────────────────────────────────

    /// Pull vehicle and station deltas from `adapter` and apply them.
    ///
    /// Station additions and removals change the travel network, which is
    /// only rebuilt from a full snapshot; they are reported through
    /// [`ReconcileReport::needs_resync`] instead of being applied.
    pub fn reconcile<A: SyncAdapter + ?Sized>(&mut self, adapter: &mut A) -> GraphResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        for kind in [NodeKind::Vehicle, NodeKind::Station] {
            let delta = adapter.read_delta(kind)?;
            if delta.is_empty() {
                continue;
            }
            match kind {
                NodeKind::Vehicle => self.apply_vehicle_delta(delta, &mut report)?,
                _ => self.apply_station_delta(delta, &mut report)?,
            }
        }
        debug!(
            "reconciled: +{} -{} ~{}{}",
            report.added,
            report.removed,
            report.changed,
            if report.needs_resync { " (resync needed)" } else { "" },
        );
        Ok(report)
    }

    fn apply_vehicle_delta(&mut self, delta: Delta, report: &mut ReconcileReport) -> GraphResult<()> {
        for id in delta.removed {
            if self.remove_vehicle(id) {
                report.removed += 1;
            } else {
                warn!("store removed {id}, which the graph does not hold");
            }
        }
        for record in delta.added {
            self.upsert_vehicle(record.id, record.node)?;
            report.added += 1;
        }
        for record in delta.changed {
            self.upsert_vehicle(record.id, record.node)?;
            report.changed += 1;
        }
        Ok(())
    }

    fn apply_station_delta(&mut self, delta: Delta, report: &mut ReconcileReport) -> GraphResult<()> {
        if !delta.added.is_empty() || !delta.removed.is_empty() {
            warn!(
                "store added {} and removed {} stations; travel network is stale",
                delta.added.len(),
                delta.removed.len(),
            );
            report.needs_resync = true;
        }
        for record in delta.changed {
            let Node::Station(station) = record.node else {
                return Err(SyncError::KindMismatch { id: record.id, expected: NodeKind::Station }.into());
            };
            match self.nodes.get_mut(&record.id) {
                Some(Node::Station(existing)) => {
                    *existing = station;
                    report.changed += 1;
                }
                _ => report.needs_resync = true,
            }
        }
        Ok(())
    }

    fn upsert_vehicle(&mut self, id: NodeId, node: Node) -> GraphResult<()> {
        let Node::Vehicle(vehicle) = node else {
            return Err(SyncError::KindMismatch { id, expected: NodeKind::Vehicle }.into());
        };
        if !matches!(self.nodes.get(&vehicle.site), Some(Node::Parking(_))) {
            return Err(GraphError::DanglingVehicle { vehicle: id, site: vehicle.site });
        }
        match self.nodes.get(&id) {
            Some(Node::Vehicle(_)) | None => {}
            Some(_) => return Err(SyncError::KindMismatch { id, expected: NodeKind::Vehicle }.into()),
        }

        self.remove_vehicle(id);
        self.site_vehicles.entry(vehicle.site).or_default().insert(id);
        self.nodes.insert(id, Node::Vehicle(vehicle));
        Ok(())
    }

    /// Drop vehicle `id` and its location entry.  `false` if absent.
    fn remove_vehicle(&mut self, id: NodeId) -> bool {
        match self.nodes.get(&id) {
            Some(Node::Vehicle(v)) => {
                let site = v.site;
                if let Some(set) = self.site_vehicles.get_mut(&site) {
                    set.remove(&id);
                }
                self.nodes.remove(&id);
                true
            }
            _ => false,
        }
    }
}

impl Default for FleetGraph {
    fn default() -> Self {
        Self::empty()
    }
}
