//! Diagnostic station desirability.
//!
//! The score is logged next to every refill candidate for offline analysis.
//! It does not take part in the dispatch decision.

use fc_graph::FleetGraph;

/// Charge below which a vehicle counts as urgent for the score.
pub const URGENT_CHARGE: f64 = 50.0;

/// `|fleet mean - target| - min(urgent vehicles, station capacity)`.
///
/// Lower is more desirable: a station whose capacity covers more urgent
/// vehicles scores lower.
pub fn station_desirability(graph: &FleetGraph, station_capacity: u32, target: f64) -> f64 {
    let gap = (graph.average_charge() - target).abs();
    let urgent = graph.count_vehicles_below(URGENT_CHARGE).min(station_capacity as usize);
    gap - urgent as f64
}
