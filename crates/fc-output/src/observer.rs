//! `SessionOutputObserver<W>`: bridges `SessionObserver` to an `OutputWriter`.

use fc_core::NodeId;
use fc_dispatch::Action;
use fc_graph::FleetGraph;
use fc_sim::{CycleReport, RunSummary, SessionObserver};

use crate::row::{CycleRow, RouteLegRow, SiteRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SessionObserver`] that writes one dispatch row and the route legs of
/// every cycle and, every `site_interval` cycles, one row per parking site.
///
/// Errors from the writer are stored internally because `SessionObserver`
/// methods have no return value.  After `session.run()` returns, check for
/// errors with [`take_error`][Self::take_error].
pub struct SessionOutputObserver<W: OutputWriter> {
    writer:        W,
    /// `0` disables site snapshots.
    site_interval: u64,
    last_error:    Option<OutputError>,
}

impl<W: OutputWriter> SessionOutputObserver<W> {
    pub fn new(writer: W, site_interval: u64) -> Self {
        Self { writer, site_interval, last_error: None }
    }

    /// Take the stored write error (if any) after `session.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl From<&CycleReport> for CycleRow {
    fn from(report: &CycleReport) -> Self {
        let plan = &report.outcome.plan;
        CycleRow {
            cycle:          report.cycle,
            from_node:      report.from.0,
            destination:    plan.destination.0,
            action:         match plan.action {
                Action::Refill { .. } => "refill",
                Action::Allocate { .. } => "allocate",
            },
            cost:           plan.cost,
            hops:           plan.path.len().saturating_sub(1) as u32,
            charged:        report.charged_count() as u32,
            inventory:      report.inventory,
            average_charge: report.average_charge,
            total_travel:   report.total_travel,
            churn_actions:  report.advance.tick.actions.len() as u32,
        }
    }
}

/// One row per edge along `path`, in travel order.
pub fn route_leg_rows(cycle: u64, path: &[NodeId], graph: &FleetGraph) -> Vec<RouteLegRow> {
    graph
        .route_edges(path)
        .into_iter()
        .enumerate()
        .map(|(leg, e)| RouteLegRow {
            cycle,
            leg:         leg as u32,
            from_node:   e.from.0,
            to_node:     e.to.0,
            travel_time: e.travel_time,
        })
        .collect()
}

/// Site rows for every parking site in `graph`, in ascending id order.
pub fn site_rows(cycle: u64, graph: &FleetGraph) -> Vec<SiteRow> {
    graph
        .site_summaries()
        .into_iter()
        .map(|s| SiteRow {
            cycle,
            site_id:       s.id.0,
            vehicle_count: s.vehicle_count as u32,
            mean_charge:   s.mean_charge,
        })
        .collect()
}

impl<W: OutputWriter> SessionObserver for SessionOutputObserver<W> {
    fn on_cycle_end(&mut self, report: &CycleReport, graph: &FleetGraph) {
        let result = self.writer.write_cycle(&CycleRow::from(report));
        self.store_err(result);

        let legs = route_leg_rows(report.cycle, &report.outcome.plan.path, graph);
        if !legs.is_empty() {
            let result = self.writer.write_legs(&legs);
            self.store_err(result);
        }

        if self.site_interval > 0 && report.cycle.is_multiple_of(self.site_interval) {
            let rows = site_rows(report.cycle, graph);
            if !rows.is_empty() {
                let result = self.writer.write_sites(&rows);
                self.store_err(result);
            }
        }
    }

    fn on_session_end(&mut self, _summary: &RunSummary) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
