//! Unit tests for fc-graph.

#[cfg(test)]
mod helpers {
    use fc_core::{NodeId, NodeKind, Position};

    use crate::{
        AttrChange, Delta, EdgeRecord, Node, NodeRecord, ParkingSite, Snapshot, Station,
        SyncAdapter, SyncError, SyncResult, Vehicle, WriteTarget,
    };

    pub const S1: NodeId = NodeId(1);
    pub const S2: NodeId = NodeId(2);
    pub const P_LOW: NodeId = NodeId(10);
    pub const P_MID: NodeId = NodeId(11);
    pub const P_EMPTY: NodeId = NodeId(12);

    /// Two stations, three parking sites.
    ///
    /// `P_LOW` holds four vehicles at 20 %, `P_MID` two at 90 %, `P_EMPTY`
    /// none.  Travel times: S1–P_LOW 5, S1–P_MID 3, P_MID–P_LOW 4,
    /// S2–P_EMPTY 2, P_EMPTY–P_LOW 6, S1–S2 20.
    pub fn fixture() -> Snapshot {
        let mut nodes = vec![
            NodeRecord::new(S1, Node::Station(Station::new("Station 1", Position::new(0.0, 0.0), 5))),
            NodeRecord::new(S2, Node::Station(Station::new("Station 2", Position::new(10.0, 10.0), 20))),
            NodeRecord::new(P_LOW, Node::Parking(ParkingSite::new("Parking 1", Position::new(2.0, 3.0), 10))),
            NodeRecord::new(P_MID, Node::Parking(ParkingSite::new("Parking 2", Position::new(1.0, 1.0), 5))),
            NodeRecord::new(P_EMPTY, Node::Parking(ParkingSite::new("Parking 3", Position::new(8.0, 9.0), 15))),
        ];
        for i in 0..4 {
            nodes.push(NodeRecord::new(
                NodeId(100 + i),
                Node::Vehicle(Vehicle::new(format!("Vehicle {i}"), 20.0, P_LOW)),
            ));
        }
        for i in 4..6 {
            nodes.push(NodeRecord::new(
                NodeId(100 + i),
                Node::Vehicle(Vehicle::new(format!("Vehicle {i}"), 90.0, P_MID)),
            ));
        }

        let edges = [
            (S1, P_LOW, 5.0),
            (S1, P_MID, 3.0),
            (P_MID, P_LOW, 4.0),
            (S2, P_EMPTY, 2.0),
            (P_EMPTY, P_LOW, 6.0),
            (S1, S2, 20.0),
        ]
        .into_iter()
        .map(|(a, b, travel_time)| EdgeRecord { a, b, travel_time })
        .collect();

        Snapshot { nodes, edges }
    }

    /// Adapter that records writes and serves scripted deltas.
    #[derive(Default)]
    pub struct RecordingAdapter {
        pub snapshot:     Snapshot,
        pub writes:       Vec<(WriteTarget, NodeId, Vec<AttrChange>)>,
        pub stale:        Vec<NodeId>,
        pub deltas:       Vec<(NodeKind, Delta)>,
        pub fail_writes:  bool,
        pub fail_commit:  bool,
        pub begins:       usize,
        pub commits:      usize,
        pub rollbacks:    usize,
    }

    impl SyncAdapter for RecordingAdapter {
        fn read_all(&mut self) -> SyncResult<Snapshot> {
            self.deltas.clear();
            Ok(self.snapshot.clone())
        }

        fn read_delta(&mut self, kind: NodeKind) -> SyncResult<Delta> {
            match self.deltas.iter().position(|(k, _)| *k == kind) {
                Some(i) => Ok(self.deltas.remove(i).1),
                None => Ok(Delta::default()),
            }
        }

        fn write(&mut self, target: WriteTarget, id: NodeId, changes: &[AttrChange]) -> SyncResult<()> {
            if self.fail_writes {
                return Err(SyncError::Backend("disk full".into()));
            }
            if self.stale.contains(&id) {
                return Err(SyncError::StaleReference(id));
            }
            self.writes.push((target, id, changes.to_vec()));
            Ok(())
        }

        fn begin(&mut self) -> SyncResult<()> {
            self.begins += 1;
            Ok(())
        }

        fn commit(&mut self) -> SyncResult<()> {
            if self.fail_commit {
                return Err(SyncError::Transaction("commit refused".into()));
            }
            self.commits += 1;
            Ok(())
        }

        fn rollback(&mut self) -> SyncResult<()> {
            self.rollbacks += 1;
            Ok(())
        }
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod build {
    use fc_core::{NodeId, NodeKind, Position};

    use super::helpers::*;
    use crate::{EdgeRecord, FleetGraph, GraphError, Node, NodeRecord, Vehicle};

    #[test]
    fn fixture_shape() {
        let graph = FleetGraph::from_snapshot(fixture()).unwrap();
        assert_eq!(graph.len(), 11);
        assert_eq!(graph.nodes_of_kind(NodeKind::Station).len(), 2);
        assert_eq!(graph.nodes_of_kind(NodeKind::Parking).len(), 3);
        assert_eq!(graph.vehicle_count(), 6);
        assert_eq!(graph.network().node_count(), 5);
        assert_eq!(graph.network().edge_count(), 12);
        assert_eq!(graph.vehicles_at(P_LOW).len(), 4);
        assert!(graph.vehicles_at(P_EMPTY).is_empty());
        assert_eq!(graph.max_station_capacity(), 20);
    }

    #[test]
    fn empty_graph() {
        let graph = FleetGraph::empty();
        assert!(graph.is_empty());
        assert_eq!(graph.average_charge(), 100.0);
        assert!(graph.low_charge_sites(80.0).is_empty());
    }

    #[test]
    fn vehicle_on_station_rejected() {
        let mut snap = fixture();
        snap.nodes.push(NodeRecord::new(NodeId(500), Node::Vehicle(Vehicle::new("stray", 50.0, S1))));
        let err = FleetGraph::from_snapshot(snap).err().unwrap();
        assert!(matches!(err, GraphError::DanglingVehicle { vehicle: NodeId(500), site: S1 }));
    }

    #[test]
    fn edge_to_vehicle_rejected() {
        let mut snap = fixture();
        snap.edges.push(EdgeRecord { a: S1, b: NodeId(100), travel_time: 1.0 });
        let err = FleetGraph::from_snapshot(snap).err().unwrap();
        assert!(matches!(err, GraphError::NonRoutableEdge { .. }));
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut snap = fixture();
        snap.nodes.push(NodeRecord::new(
            S1,
            Node::Parking(crate::ParkingSite::new("dup", Position::new(0.0, 0.0), 5)),
        ));
        assert!(matches!(FleetGraph::from_snapshot(snap), Err(GraphError::DuplicateNode(S1))));
    }

    #[test]
    fn load_reads_full_snapshot() {
        let mut adapter = RecordingAdapter { snapshot: fixture(), ..Default::default() };
        let graph = FleetGraph::load(&mut adapter).unwrap();
        assert_eq!(graph.vehicle_count(), 6);
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queries {
    use fc_core::{NodeId, StationStatus};

    use super::helpers::*;
    use crate::{AttrChange, FleetGraph};

    fn graph() -> FleetGraph {
        FleetGraph::from_snapshot(fixture()).unwrap()
    }

    #[test]
    fn available_stations_excludes_charging() {
        let mut g = graph();
        assert_eq!(g.available_stations(), vec![S1, S2]);
        let mut adapter = RecordingAdapter::default();
        g.update_attributes(S1, &[AttrChange::Status(StationStatus::Charging)], &mut adapter).unwrap();
        assert_eq!(g.available_stations(), vec![S2]);
    }

    #[test]
    fn low_sites_skip_empty_sites() {
        let g = graph();
        // P_EMPTY has no vehicles; it must never appear, whatever the threshold.
        assert_eq!(g.low_charge_sites(80.0), vec![P_LOW]);
        assert_eq!(g.low_charge_sites(1_000.0), vec![P_LOW, P_MID]);
        assert!(g.low_charge_sites(20.0).is_empty());
    }

    #[test]
    fn low_sites_order_count_then_mean_then_id() {
        let mut g = graph();
        let mut adapter = RecordingAdapter::default();
        // Move two vehicles to P_MID and drain it: P_LOW 2@20, P_MID 4 with lower mean.
        for id in [NodeId(100), NodeId(101)] {
            g.update_attributes(id, &[AttrChange::Site(P_MID)], &mut adapter).unwrap();
        }
        for id in [NodeId(104), NodeId(105)] {
            g.update_attributes(id, &[AttrChange::Charge(10.0)], &mut adapter).unwrap();
        }
        // P_MID: 4 vehicles, mean 15.  P_LOW: 2 vehicles, mean 20.
        assert_eq!(g.low_charge_sites(80.0), vec![P_MID, P_LOW]);

        // P_LOW: 20, 20, 10.  P_MID: 20, 20, 10.  Same count and mean, id breaks tie.
        g.update_attributes(NodeId(104), &[AttrChange::Site(P_LOW)], &mut adapter).unwrap();
        assert_eq!(g.vehicles_at(P_LOW).len(), 3);
        assert_eq!(g.vehicles_at(P_MID).len(), 3);
        assert_eq!(g.low_charge_sites(80.0), vec![P_LOW, P_MID]);

        // Same count: lower mean first.
        g.update_attributes(NodeId(105), &[AttrChange::Charge(5.0)], &mut adapter).unwrap();
        assert_eq!(g.low_charge_sites(80.0), vec![P_MID, P_LOW]);
    }

    #[test]
    fn vehicles_below_neediest_first() {
        let mut g = graph();
        let mut adapter = RecordingAdapter::default();
        g.update_attributes(NodeId(102), &[AttrChange::Charge(5.0)], &mut adapter).unwrap();
        g.update_attributes(NodeId(100), &[AttrChange::Charge(79.9)], &mut adapter).unwrap();
        let below = g.vehicles_below(P_LOW, 80.0);
        assert_eq!(
            below,
            vec![(NodeId(102), 5.0), (NodeId(101), 20.0), (NodeId(103), 20.0), (NodeId(100), 79.9)]
        );
        // Strictly below.
        assert_eq!(g.vehicles_below(P_LOW, 20.0), vec![(NodeId(102), 5.0)]);
        assert!(g.vehicles_below(P_EMPTY, 80.0).is_empty());
    }

    #[test]
    fn average_charge() {
        let g = graph();
        let expected = (4.0 * 20.0 + 2.0 * 90.0) / 6.0;
        assert!((g.average_charge() - expected).abs() < 1e-12);
        assert_eq!(g.count_vehicles_below(50.0), 4);
    }

    #[test]
    fn site_summaries_default_to_full() {
        let g = graph();
        let summaries = g.site_summaries();
        assert_eq!(summaries.len(), 3);
        let empty = summaries.iter().find(|s| s.id == P_EMPTY).unwrap();
        assert_eq!(empty.vehicle_count, 0);
        assert_eq!(empty.mean_charge, 100.0);
        let low = summaries.iter().find(|s| s.id == P_LOW).unwrap();
        assert_eq!(low.vehicle_count, 4);
        assert_eq!(low.mean_charge, 20.0);
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use fc_core::{NodeId, StationStatus};
    use fc_spatial::DijkstraRouter;

    use super::helpers::*;
    use crate::{AttrChange, FleetGraph, GraphError};

    #[test]
    fn plain_route() {
        let g = FleetGraph::from_snapshot(fixture()).unwrap();
        let route = g.route(&DijkstraRouter, S1, P_LOW, false).unwrap();
        assert_eq!(route.nodes, vec![S1, P_LOW]);
        assert_eq!(route.cost, 5.0);

        let edges = g.route_edges(&route.nodes);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].travel_time, 5.0);
    }

    #[test]
    fn charge_penalty_only_for_stations() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        g.update_attributes(
            S2,
            &[AttrChange::Status(StationStatus::Charging), AttrChange::TimeRemaining(30)],
            &mut adapter,
        )
        .unwrap();

        let plain = g.route(&DijkstraRouter, P_EMPTY, S2, false).unwrap();
        let charged = g.route(&DijkstraRouter, P_EMPTY, S2, true).unwrap();
        assert_eq!(plain.cost, 2.0);
        assert_eq!(charged.cost, 32.0);

        // Parking destinations never pay a penalty.
        let to_site = g.route(&DijkstraRouter, S2, P_EMPTY, true).unwrap();
        assert_eq!(to_site.cost, 2.0);
    }

    #[test]
    fn vehicles_are_not_endpoints() {
        let g = FleetGraph::from_snapshot(fixture()).unwrap();
        let err = g.route(&DijkstraRouter, S1, NodeId(100), false).unwrap_err();
        assert!(matches!(err, GraphError::NotRoutable(NodeId(100))));
        let err = g.route(&DijkstraRouter, S1, NodeId(9_999), false).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
    }
}

// ── update_attributes ─────────────────────────────────────────────────────────

#[cfg(test)]
mod writes {
    use fc_core::{NodeId, NodeKind, StationStatus};

    use super::helpers::*;
    use crate::{AttrChange, FleetGraph, GraphError, WriteTarget};

    #[test]
    fn forwards_to_kind_writer() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        g.update_attributes(NodeId(100), &[AttrChange::Charge(100.0)], &mut adapter).unwrap();
        g.update_attributes(S1, &[AttrChange::TimeRemaining(30)], &mut adapter).unwrap();

        assert_eq!(adapter.writes.len(), 2);
        assert_eq!(adapter.writes[0].0, WriteTarget::Vehicle);
        assert_eq!(adapter.writes[1].0, WriteTarget::Station);
        assert_eq!(g.vehicle(NodeId(100)).unwrap().charge, 100.0);
        assert_eq!(g.station(S1).unwrap().time_remaining, 30);
    }

    #[test]
    fn parking_has_no_writer() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        let err = g.update_attributes(P_LOW, &[AttrChange::Charge(1.0)], &mut adapter).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNodeKind { kind: NodeKind::Parking, .. }));
        assert!(adapter.writes.is_empty());
    }

    #[test]
    fn mismatched_attribute_mutates_nothing() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        let err = g
            .update_attributes(
                NodeId(100),
                &[AttrChange::Charge(99.0), AttrChange::Status(StationStatus::Empty)],
                &mut adapter,
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::AttributeMismatch { attribute: "status", .. }));
        assert_eq!(g.vehicle(NodeId(100)).unwrap().charge, 20.0);
        assert!(adapter.writes.is_empty());
    }

    #[test]
    fn relocation_to_non_parking_rejected() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        let err = g.update_attributes(NodeId(100), &[AttrChange::Site(S1)], &mut adapter).unwrap_err();
        assert!(matches!(err, GraphError::DanglingVehicle { .. }));
        assert_eq!(g.vehicles_at(P_LOW).len(), 4);
    }

    #[test]
    fn stale_reference_is_tolerated() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter { stale: vec![NodeId(101)], ..Default::default() };
        g.update_attributes(NodeId(101), &[AttrChange::Charge(100.0)], &mut adapter).unwrap();
        assert!(adapter.writes.is_empty());
        assert_eq!(g.vehicle(NodeId(101)).unwrap().charge, 100.0);
    }

    #[test]
    fn backend_failure_surfaces() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter { fail_writes: true, ..Default::default() };
        let err = g.update_attributes(NodeId(101), &[AttrChange::Charge(100.0)], &mut adapter).unwrap_err();
        assert!(matches!(err, GraphError::Sync(_)));
    }

    #[test]
    fn unknown_node() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        let err = g.update_attributes(NodeId(4_242), &[], &mut adapter).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(NodeId(4_242))));
    }
}

// ── Reconciliation ────────────────────────────────────────────────────────────

#[cfg(test)]
mod reconcile {
    use fc_core::{NodeId, NodeKind, Position, StationStatus};

    use super::helpers::*;
    use crate::{Delta, FleetGraph, GraphError, Node, NodeRecord, Station, Vehicle};

    #[test]
    fn vehicle_delta_applied() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        adapter.deltas.push((
            NodeKind::Vehicle,
            Delta {
                added:   vec![NodeRecord::new(NodeId(200), Node::Vehicle(Vehicle::new("new", 60.0, P_EMPTY)))],
                removed: vec![NodeId(104)],
                changed: vec![NodeRecord::new(NodeId(100), Node::Vehicle(Vehicle::new("Vehicle 0", 19.6, P_MID)))],
            },
        ));

        let report = g.reconcile(&mut adapter).unwrap();
        assert_eq!((report.added, report.removed, report.changed), (1, 1, 1));
        assert!(!report.needs_resync);
        assert_eq!(g.vehicles_at(P_EMPTY), vec![NodeId(200)]);
        assert_eq!(g.vehicles_at(P_MID), vec![NodeId(100), NodeId(105)]);
        assert_eq!(g.vehicles_at(P_LOW).len(), 3);
        assert!(g.vehicle(NodeId(104)).is_none());
    }

    #[test]
    fn station_change_applied_topology_change_flagged() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        let mut s1 = g.station(S1).unwrap().clone();
        s1.status = StationStatus::Ready;
        s1.time_remaining = 0;
        let mut charging = s1.clone();
        charging.status = StationStatus::Charging;
        charging.time_remaining = 12;
        adapter.deltas.push((
            NodeKind::Station,
            Delta {
                added:   vec![NodeRecord::new(NodeId(3), Node::Station(Station::new("Station 3", Position::new(5.0, 5.0), 20)))],
                removed: vec![],
                changed: vec![NodeRecord::new(S1, Node::Station(charging))],
            },
        ));

        let report = g.reconcile(&mut adapter).unwrap();
        assert!(report.needs_resync);
        assert_eq!(report.changed, 1);
        assert_eq!(g.station(S1).unwrap().time_remaining, 12);
        assert!(!g.contains(NodeId(3)));
    }

    #[test]
    fn removal_of_unknown_vehicle_is_skipped() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        adapter.deltas.push((NodeKind::Vehicle, Delta { removed: vec![NodeId(777)], ..Default::default() }));
        let report = g.reconcile(&mut adapter).unwrap();
        assert_eq!(report.removed, 0);
        assert_eq!(g.vehicle_count(), 6);
    }

    #[test]
    fn wrong_record_kind_in_vehicle_delta() {
        let mut g = FleetGraph::from_snapshot(fixture()).unwrap();
        let mut adapter = RecordingAdapter::default();
        adapter.deltas.push((
            NodeKind::Vehicle,
            Delta {
                added: vec![NodeRecord::new(NodeId(300), Node::Station(Station::new("x", Position::new(0.0, 0.0), 1)))],
                ..Default::default()
            },
        ));
        assert!(matches!(g.reconcile(&mut adapter), Err(GraphError::Sync(_))));
    }
}

// ── Transactions ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod transactions {
    use super::helpers::RecordingAdapter;
    use crate::{transact, SyncError};

    #[test]
    fn commit_on_success() {
        let mut adapter = RecordingAdapter::default();
        let out: Result<u32, SyncError> = transact(&mut adapter, |_| Ok(7));
        assert_eq!(out.unwrap(), 7);
        assert_eq!((adapter.begins, adapter.commits, adapter.rollbacks), (1, 1, 0));
    }

    #[test]
    fn rollback_on_failure() {
        let mut adapter = RecordingAdapter::default();
        let out: Result<(), SyncError> =
            transact(&mut adapter, |_| Err(SyncError::Backend("boom".into())));
        assert!(out.is_err());
        assert_eq!((adapter.begins, adapter.commits, adapter.rollbacks), (1, 0, 1));
    }

    #[test]
    fn failed_commit_is_reported() {
        let mut adapter = RecordingAdapter { fail_commit: true, ..Default::default() };
        let out: Result<(), SyncError> = transact(&mut adapter, |_| Ok(()));
        assert!(matches!(out, Err(SyncError::Transaction(_))));
    }
}
