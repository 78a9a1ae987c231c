//! Session observer trait for progress reporting and data collection.

use fc_graph::FleetGraph;

use crate::{CycleReport, RunSummary};

/// Callbacks invoked by [`Session::run`][crate::Session::run] around each
/// dispatch cycle.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl SessionObserver for ProgressPrinter {
///     fn on_cycle_end(&mut self, report: &CycleReport, _graph: &FleetGraph) {
///         println!("cycle {}: average {:.1}", report.cycle, report.average_charge);
///     }
/// }
/// ```
pub trait SessionObserver {
    /// Called before the cycle's dispatch decision.
    fn on_cycle_start(&mut self, _cycle: u64, _graph: &FleetGraph) {}

    /// Called after the cycle's tick has been reconciled into `graph`.
    ///
    /// Output writers take their per-site snapshot here, through
    /// [`FleetGraph::site_summaries`].
    fn on_cycle_end(&mut self, _report: &CycleReport, _graph: &FleetGraph) {}

    /// Called once when the driving loop stops.
    fn on_session_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SessionObserver`] that does nothing.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
