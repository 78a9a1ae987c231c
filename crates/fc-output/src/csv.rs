//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `dispatch_log.csv`
//! - `route_legs.csv`
//! - `site_snapshots.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::{CycleRow, OutputResult, RouteLegRow, SiteRow};
use crate::writer::OutputWriter;

pub const DISPATCH_LOG: &str = "dispatch_log.csv";
pub const ROUTE_LEGS: &str = "route_legs.csv";
pub const SITE_SNAPSHOTS: &str = "site_snapshots.csv";

/// Writes session output to three CSV files.
pub struct CsvWriter {
    cycles:   Writer<File>,
    legs:     Writer<File>,
    sites:    Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the three CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut cycles = Writer::from_path(dir.join(DISPATCH_LOG))?;
        cycles.write_record([
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
        ])?;

        let mut legs = Writer::from_path(dir.join(ROUTE_LEGS))?;
        legs.write_record(["cycle", "leg", "from_node", "to_node", "travel_time"])?;

        let mut sites = Writer::from_path(dir.join(SITE_SNAPSHOTS))?;
        sites.write_record(["cycle", "site_id", "vehicle_count", "mean_charge"])?;

        Ok(Self { cycles, legs, sites, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_cycle(&mut self, row: &CycleRow) -> OutputResult<()> {
        self.cycles.write_record(&[
            row.cycle.to_string(),
            row.from_node.to_string(),
            row.destination.to_string(),
            row.action.to_owned(),
            format!("{:.2}", row.cost),
            row.hops.to_string(),
            row.charged.to_string(),
            row.inventory.to_string(),
            format!("{:.2}", row.average_charge),
            format!("{:.2}", row.total_travel),
            row.churn_actions.to_string(),
        ])?;
        Ok(())
    }

    fn write_legs(&mut self, rows: &[RouteLegRow]) -> OutputResult<()> {
        for row in rows {
            self.legs.write_record(&[
                row.cycle.to_string(),
                row.leg.to_string(),
                row.from_node.to_string(),
                row.to_node.to_string(),
                format!("{:.2}", row.travel_time),
            ])?;
        }
        Ok(())
    }

    fn write_sites(&mut self, rows: &[SiteRow]) -> OutputResult<()> {
        for row in rows {
            self.sites.write_record(&[
                row.cycle.to_string(),
                row.site_id.to_string(),
                row.vehicle_count.to_string(),
                format!("{:.2}", row.mean_charge),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.cycles.flush()?;
        self.legs.flush()?;
        self.sites.flush()?;
        Ok(())
    }
}
