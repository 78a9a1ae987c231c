//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `dispatch_log`, `route_legs` and `site_snapshots`.

use std::path::Path;

use rusqlite::Connection;

use crate::{CycleRow, OutputResult, RouteLegRow, SiteRow};
use crate::writer::OutputWriter;

/// Writes session output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS dispatch_log (
                 cycle          INTEGER PRIMARY KEY,
                 from_node      INTEGER NOT NULL,
                 destination    INTEGER NOT NULL,
                 action         TEXT    NOT NULL,
                 cost           REAL    NOT NULL,
                 hops           INTEGER NOT NULL,
                 charged        INTEGER NOT NULL,
                 inventory      INTEGER NOT NULL,
                 average_charge REAL    NOT NULL,
                 total_travel   REAL    NOT NULL,
                 churn_actions  INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS route_legs (
                 cycle       INTEGER NOT NULL,
                 leg         INTEGER NOT NULL,
                 from_node   INTEGER NOT NULL,
                 to_node     INTEGER NOT NULL,
                 travel_time REAL    NOT NULL,
                 PRIMARY KEY (cycle, leg)
             );
             CREATE TABLE IF NOT EXISTS site_snapshots (
                 cycle         INTEGER NOT NULL,
                 site_id       INTEGER NOT NULL,
                 vehicle_count INTEGER NOT NULL,
                 mean_charge   REAL    NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_cycle(&mut self, row: &CycleRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO dispatch_log \
             (cycle, from_node, destination, action, cost, hops, charged, inventory, \
              average_charge, total_travel, churn_actions) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                row.cycle as i64,
                row.from_node,
                row.destination,
                row.action,
                row.cost,
                row.hops,
                row.charged,
                row.inventory,
                row.average_charge,
                row.total_travel,
                row.churn_actions,
            ],
        )?;
        Ok(())
    }

    fn write_legs(&mut self, rows: &[RouteLegRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO route_legs (cycle, leg, from_node, to_node, travel_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.cycle as i64,
                    row.leg,
                    row.from_node,
                    row.to_node,
                    row.travel_time,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_sites(&mut self, rows: &[SiteRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO site_snapshots (cycle, site_id, vehicle_count, mean_charge) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.cycle as i64,
                    row.site_id,
                    row.vehicle_count,
                    row.mean_charge,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
