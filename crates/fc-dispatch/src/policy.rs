//! The `DispatchPolicy` trait and the default nearest-first policy.

use log::debug;

use fc_core::{NodeId, NodeKind};
use fc_graph::{FleetGraph, GraphError};
use fc_spatial::{DijkstraRouter, Route, Router, SpatialError};

use crate::heuristic::station_desirability;
use crate::{Action, Agent, DispatchError, DispatchResult, Plan};

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Decides the agent's next destination.
///
/// Policies only read the graph.  Effects are applied by the
/// [`Dispatcher`](crate::Dispatcher) after the policy has chosen.
pub trait DispatchPolicy: Send + Sync {
    /// Choose the next plan for `agent`.  `target` is the fleet charge the
    /// session is driving toward.
    fn plan(&self, graph: &FleetGraph, agent: &Agent, target: f64) -> DispatchResult<Plan>;
}

// ── NearestFirstPolicy ────────────────────────────────────────────────────────

/// Goes to the closest useful node.
///
/// * **Empty inventory:** the ready station with the lowest travel time plus
///   remaining charge time.  When no station is ready, every station is a
///   candidate and the charge time is paid on arrival.
/// * **Inventory left:** the low-charge parking site with the lowest travel
///   time.
///
/// The agent's own location is never a candidate unless it is the only one.
/// Ties go to the first candidate in query order (ascending id for stations,
/// [`FleetGraph::low_charge_sites`] order for sites).
pub struct NearestFirstPolicy<R: Router = DijkstraRouter> {
    router:             R,
    low_site_threshold: f64,
}

impl NearestFirstPolicy<DijkstraRouter> {
    pub fn new(low_site_threshold: f64) -> Self {
        Self::with_router(DijkstraRouter, low_site_threshold)
    }
}

impl<R: Router> NearestFirstPolicy<R> {
    pub fn with_router(router: R, low_site_threshold: f64) -> Self {
        Self { router, low_site_threshold }
    }

    pub fn low_site_threshold(&self) -> f64 {
        self.low_site_threshold
    }

    fn refill_plan(&self, graph: &FleetGraph, agent: &Agent, target: f64) -> DispatchResult<Plan> {
        let mut candidates = graph.available_stations();
        if candidates.is_empty() {
            debug!("no ready station; considering all stations");
            candidates = graph.nodes_of_kind(NodeKind::Station).into_iter().collect();
        }
        if candidates.is_empty() {
            return Err(DispatchError::NoStations);
        }
        exclude_current(&mut candidates, agent.location);

        for &id in &candidates {
            if let Some(station) = graph.station(id) {
                debug!(
                    "candidate {id}: desirability {:.2}",
                    station_desirability(graph, station.capacity, target),
                );
            }
        }

        let (station, route) = self.nearest(graph, agent.location, &candidates, true)?;
        Ok(Plan::from_route(route, station, Action::Refill { station }))
    }

    fn distribute_plan(&self, graph: &FleetGraph, agent: &Agent) -> DispatchResult<Plan> {
        let mut candidates = graph.low_charge_sites(self.low_site_threshold);
        if candidates.is_empty() {
            return Err(DispatchError::NoCandidates);
        }
        exclude_current(&mut candidates, agent.location);

        let (site, route) = self.nearest(graph, agent.location, &candidates, false)?;
        Ok(Plan::from_route(route, site, Action::Allocate { site }))
    }

    /// Argmin of route cost over `candidates`; the first minimum wins.
    /// Unreachable candidates are skipped.
    fn nearest(
        &self,
        graph:      &FleetGraph,
        from:       NodeId,
        candidates: &[NodeId],
        to_charge:  bool,
    ) -> DispatchResult<(NodeId, Route)> {
        let mut best: Option<(NodeId, Route)> = None;
        for &candidate in candidates {
            let route = match graph.route(&self.router, from, candidate, to_charge) {
                Ok(route) => route,
                Err(GraphError::Spatial(SpatialError::NoRoute { .. })) => {
                    debug!("{candidate} unreachable from {from}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if best.as_ref().is_none_or(|(_, b)| route.cost < b.cost) {
                best = Some((candidate, route));
            }
        }
        best.ok_or(DispatchError::Unreachable { from })
    }
}

impl<R: Router> DispatchPolicy for NearestFirstPolicy<R> {
    fn plan(&self, graph: &FleetGraph, agent: &Agent, target: f64) -> DispatchResult<Plan> {
        let plan = if agent.is_empty() {
            self.refill_plan(graph, agent, target)?
        } else {
            self.distribute_plan(graph, agent)?
        };
        debug!(
            "plan: {} -> {} ({:?}), cost {:.2}, {} hops",
            agent.location,
            plan.destination,
            plan.action,
            plan.cost,
            plan.path.len().saturating_sub(1),
        );
        Ok(plan)
    }
}

fn exclude_current(candidates: &mut Vec<NodeId>, location: NodeId) {
    if candidates.len() > 1 {
        candidates.retain(|&c| c != location);
    }
}
