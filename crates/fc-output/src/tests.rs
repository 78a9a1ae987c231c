//! Integration tests for fc-output.

#[cfg(test)]
mod fixtures {
    use fc_core::{ChurnConfig, FleetConfig, NodeId, Position};
    use fc_graph::{EdgeRecord, Node, NodeRecord, ParkingSite, Snapshot, Station, Vehicle};

    use crate::row::{CycleRow, RouteLegRow, SiteRow};

    pub fn cycle_row(cycle: u64) -> CycleRow {
        CycleRow {
            cycle,
            from_node:      1,
            destination:    10,
            action:         "allocate",
            cost:           5.0,
            hops:           1,
            charged:        4,
            inventory:      1,
            average_charge: 97.6,
            total_travel:   5.0,
            churn_actions:  3,
        }
    }

    pub fn leg_row(leg: u32) -> RouteLegRow {
        RouteLegRow { cycle: 2, leg, from_node: 11 + leg, to_node: 12 + leg, travel_time: 4.126 }
    }

    pub fn site_row(site_id: u32) -> SiteRow {
        SiteRow { cycle: 1, site_id, vehicle_count: 2, mean_charge: 62.5 }
    }

    /// Station 1, `Parking` 10 with four vehicles at 20, `Parking` 11 with
    /// one at 90.
    pub fn snapshot() -> Snapshot {
        let mut nodes = vec![
            NodeRecord::new(NodeId(1), Node::Station(Station::new("Station 1", Position::new(0.0, 0.0), 5))),
            NodeRecord::new(NodeId(10), Node::Parking(ParkingSite::new("Parking 1", Position::new(5.0, 0.0), 5))),
            NodeRecord::new(NodeId(11), Node::Parking(ParkingSite::new("Parking 2", Position::new(0.0, 3.0), 5))),
        ];
        for id in 100..104 {
            nodes.push(NodeRecord::new(NodeId(id), Node::Vehicle(Vehicle::new(format!("Vehicle {id}"), 20.0, NodeId(10)))));
        }
        nodes.push(NodeRecord::new(NodeId(104), Node::Vehicle(Vehicle::new("Vehicle 104", 90.0, NodeId(11)))));
        let edges = [(1, 10, 5.0), (1, 11, 3.0), (10, 11, 4.0)]
            .into_iter()
            .map(|(a, b, travel_time)| EdgeRecord { a: NodeId(a), b: NodeId(b), travel_time })
            .collect();
        Snapshot { nodes, edges }
    }

    pub fn frozen_config() -> FleetConfig {
        FleetConfig {
            churn: ChurnConfig { enabled: false, discharge_per_tick: 0.0, ..ChurnConfig::default() },
            ..FleetConfig::default()
        }
    }
}

// ── CSV tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::fixtures::*;
    use crate::csv::{CsvWriter, DISPATCH_LOG, ROUTE_LEGS, SITE_SNAPSHOTS};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn records(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join(DISPATCH_LOG).exists());
        assert!(dir.path().join(ROUTE_LEGS).exists());
        assert!(dir.path().join(SITE_SNAPSHOTS).exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join(DISPATCH_LOG)).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(
            headers,
            [
                "cycle",
                "from_node",
                "destination",
                "action",
                "cost",
                "hops",
                "charged",
                "inventory",
                "average_charge",
                "total_travel",
                "churn_actions",
            ]
        );

        let mut rdr2 = csv::Reader::from_path(dir.path().join(SITE_SNAPSHOTS)).unwrap();
        let headers2: Vec<_> = rdr2.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers2, ["cycle", "site_id", "vehicle_count", "mean_charge"]);

        let mut rdr3 = csv::Reader::from_path(dir.path().join(ROUTE_LEGS)).unwrap();
        let headers3: Vec<_> = rdr3.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers3, ["cycle", "leg", "from_node", "to_node", "travel_time"]);
    }

    #[test]
    fn csv_cycle_row_formatting() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_cycle(&cycle_row(7)).unwrap();
        w.finish().unwrap();

        let rows = records(&dir, DISPATCH_LOG);
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "7");
        assert_eq!(&rows[0][3], "allocate");
        assert_eq!(&rows[0][4], "5.00");
        assert_eq!(&rows[0][8], "97.60");
        assert_eq!(&rows[0][10], "3");
    }

    #[test]
    fn csv_site_rows() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_sites(&[site_row(10), site_row(11)]).unwrap();
        w.finish().unwrap();

        let rows = records(&dir, SITE_SNAPSHOTS);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "10");
        assert_eq!(&rows[1][1], "11");
        assert_eq!(&rows[1][3], "62.50");
    }

    #[test]
    fn csv_leg_rows() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_legs(&[leg_row(0), leg_row(1)]).unwrap();
        w.finish().unwrap();

        let rows = records(&dir, ROUTE_LEGS);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "1");
        assert_eq!(&rows[1][2], "12");
        assert_eq!(&rows[1][3], "13");
        assert_eq!(&rows[1][4], "4.13");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_missing_directory_fails() {
        let dir = tmp();
        assert!(CsvWriter::new(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn integration_csv() {
        use fc_sim::SessionBuilder;
        use fc_store::MemoryStore;

        use crate::observer::SessionOutputObserver;

        let mut session = SessionBuilder::new(frozen_config(), MemoryStore::from_snapshot(snapshot()))
            .build()
            .unwrap();

        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SessionOutputObserver::new(writer, 1);
        let summary = session.run(&mut obs).unwrap();
        assert_eq!(summary.cycles, 1);
        assert!(obs.take_error().is_none(), "no write errors expected");

        let cycles = records(&dir, DISPATCH_LOG);
        assert_eq!(cycles.len(), 1);
        assert_eq!(&cycles[0][1], "1");
        assert_eq!(&cycles[0][2], "10");
        assert_eq!(&cycles[0][3], "allocate");
        assert_eq!(&cycles[0][6], "4");
        assert_eq!(&cycles[0][7], "1");
        assert_eq!(&cycles[0][8], "98.00");

        // The direct edge 1 -> 10 beats 1 -> 11 -> 10.
        let legs = records(&dir, ROUTE_LEGS);
        assert_eq!(legs.len(), 1);
        assert_eq!(&legs[0][0], "1");
        assert_eq!(&legs[0][1], "0");
        assert_eq!(&legs[0][2], "1");
        assert_eq!(&legs[0][3], "10");
        assert_eq!(&legs[0][4], "5.00");

        // One row per parking site, ascending id.
        let sites = records(&dir, SITE_SNAPSHOTS);
        assert_eq!(sites.len(), 2);
        assert_eq!(&sites[0][1], "10");
        assert_eq!(&sites[0][2], "4");
        assert_eq!(&sites[0][3], "100.00");
        assert_eq!(&sites[1][3], "90.00");
    }

    #[test]
    fn site_interval_zero_skips_sites() {
        use fc_sim::SessionBuilder;
        use fc_store::MemoryStore;

        use crate::observer::SessionOutputObserver;

        let mut session = SessionBuilder::new(frozen_config(), MemoryStore::from_snapshot(snapshot()))
            .build()
            .unwrap();
        let dir = tmp();
        let mut obs = SessionOutputObserver::new(CsvWriter::new(dir.path()).unwrap(), 0);
        session.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());
        assert_eq!(records(&dir, DISPATCH_LOG).len(), 1);
        assert!(records(&dir, SITE_SNAPSHOTS).is_empty());
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use fc_graph::FleetGraph;
    use fc_sim::{RunSummary, SessionObserver, StopReason};

    use super::fixtures::*;
    use fc_core::NodeId;

    use crate::{
        route_leg_rows, site_rows, CycleRow, OutputError, OutputResult, OutputWriter, RouteLegRow,
        SessionOutputObserver, SiteRow,
    };

    /// Fails every write after the first `ok` calls.
    struct FailingWriter {
        ok:       usize,
        calls:    usize,
        finished: bool,
    }

    impl FailingWriter {
        fn check(&mut self) -> OutputResult<()> {
            self.calls += 1;
            if self.calls > self.ok {
                Err(OutputError::Io(std::io::Error::other(format!("write {}", self.calls))))
            } else {
                Ok(())
            }
        }
    }

    impl OutputWriter for FailingWriter {
        fn write_cycle(&mut self, _row: &CycleRow) -> OutputResult<()> {
            self.check()
        }
        fn write_legs(&mut self, _rows: &[RouteLegRow]) -> OutputResult<()> {
            self.check()
        }
        fn write_sites(&mut self, _rows: &[SiteRow]) -> OutputResult<()> {
            self.check()
        }
        fn finish(&mut self) -> OutputResult<()> {
            self.finished = true;
            self.check()
        }
    }

    fn summary() -> RunSummary {
        RunSummary {
            cycles:        0,
            total_travel:  0.0,
            final_average: 100.0,
            stop:          StopReason::TargetReached,
            inventory:     0,
        }
    }

    #[test]
    fn first_error_is_kept() {
        let writer = FailingWriter { ok: 0, calls: 0, finished: false };
        let mut obs = SessionOutputObserver::new(writer, 1);
        obs.on_session_end(&summary());
        obs.on_session_end(&summary());

        let err = obs.take_error().unwrap();
        assert!(err.to_string().contains("write 1"), "{err}");
        assert!(obs.take_error().is_none());
        assert!(obs.into_writer().finished);
    }

    #[test]
    fn route_legs_follow_the_path() {
        let graph = FleetGraph::from_snapshot(snapshot()).unwrap();
        let rows = route_leg_rows(4, &[NodeId(1), NodeId(11), NodeId(10)], &graph);
        assert_eq!(
            rows,
            vec![
                RouteLegRow { cycle: 4, leg: 0, from_node: 1, to_node: 11, travel_time: 3.0 },
                RouteLegRow { cycle: 4, leg: 1, from_node: 11, to_node: 10, travel_time: 4.0 },
            ],
        );
        assert!(route_leg_rows(4, &[NodeId(1)], &graph).is_empty());
    }

    #[test]
    fn site_rows_follow_graph_summaries() {
        let graph = FleetGraph::from_snapshot(snapshot()).unwrap();
        let rows = site_rows(3, &graph);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], SiteRow { cycle: 3, site_id: 10, vehicle_count: 4, mean_charge: 20.0 });
        assert_eq!(rows[1], SiteRow { cycle: 3, site_id: 11, vehicle_count: 1, mean_charge: 90.0 });
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use super::fixtures::*;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_cycle_and_site_counts() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_cycle(&cycle_row(1)).unwrap();
        w.write_cycle(&cycle_row(2)).unwrap();
        w.write_sites(&[site_row(10), site_row(11), site_row(12)]).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let cycles: i64 = conn.query_row("SELECT COUNT(*) FROM dispatch_log", [], |r| r.get(0)).unwrap();
        let sites: i64 = conn.query_row("SELECT COUNT(*) FROM site_snapshots", [], |r| r.get(0)).unwrap();
        assert_eq!(cycles, 2);
        assert_eq!(sites, 3);
    }

    #[test]
    fn sqlite_leg_rows() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_legs(&[leg_row(0), leg_row(1)]).unwrap();
        w.write_legs(&[]).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let to_node: u32 = conn
            .query_row("SELECT to_node FROM route_legs WHERE cycle = 2 AND leg = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(to_node, 13);
    }

    #[test]
    fn sqlite_action_stored_as_text() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_cycle(&cycle_row(4)).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let (action, average): (String, f64) = conn
            .query_row("SELECT action, average_charge FROM dispatch_log WHERE cycle = 4", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(action, "allocate");
        assert_eq!(average, 97.6);
    }

    #[test]
    fn sqlite_duplicate_cycle_rejected() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_cycle(&cycle_row(1)).unwrap();
        assert!(w.write_cycle(&cycle_row(1)).is_err());
    }

    #[test]
    fn sqlite_empty_sites_ok() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_sites(&[]).unwrap();
    }
}
