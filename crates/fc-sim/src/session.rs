//! The `Session` struct and its driving loop.

use log::{info, warn};

use fc_core::{FleetConfig, NodeId, NodeKind, SimRng};
use fc_dispatch::{refill, Agent, DispatchPolicy, Dispatcher, NearestFirstPolicy, StepOutcome};
use fc_graph::{transact, FleetGraph, FleetStore, ReconcileReport};

use crate::topology::{generate, TopologyParams};
use crate::{FleetSimulator, SessionObserver, SimError, SimResult, TickReport};

// ── Reports ───────────────────────────────────────────────────────────────────

/// What one [`Session::advance`] did to the store and the graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdvanceReport {
    pub tick:      TickReport,
    pub reconcile: ReconcileReport,
    /// The graph was rebuilt from a full snapshot after reconciling.
    pub resynced:  bool,
}

/// One completed dispatch cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number within the session.
    pub cycle:          u64,
    /// Agent location before the move.
    pub from:           NodeId,
    pub outcome:        StepOutcome,
    /// Agent inventory after the effect.
    pub inventory:      u32,
    /// Fleet average after the tick was reconciled.
    pub average_charge: f64,
    /// Running travel total, this cycle included.
    pub total_travel:   f64,
    pub advance:        AdvanceReport,
}

impl CycleReport {
    pub fn charged_count(&self) -> usize {
        self.outcome.charged_count()
    }
}

/// Why [`Session::run`] stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Fleet average reached the target.  An empty fleet counts as reached.
    TargetReached,
    /// No parking site is below the low-charge threshold.
    NoLowSites,
    /// The configured cycle limit was hit.
    MaxCycles,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub cycles:        u64,
    pub total_travel:  f64,
    pub final_average: f64,
    pub stop:          StopReason,
    pub inventory:     u32,
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One simulation session: the fleet graph, the charging agent, the backing
/// store, the fleet simulator and the dispatcher, owned together.
///
/// Every operation runs to completion on the caller's thread.  The graph is
/// only mutated through the session.
///
/// Create via [`SessionBuilder`][crate::SessionBuilder].
pub struct Session<S: FleetStore, P: DispatchPolicy = NearestFirstPolicy> {
    pub(crate) config:       FleetConfig,
    pub(crate) graph:        FleetGraph,
    pub(crate) agent:        Agent,
    pub(crate) store:        S,
    pub(crate) dispatcher:   Dispatcher<P>,
    pub(crate) simulator:    FleetSimulator,
    /// Stream used by [`Session::regenerate`].
    pub(crate) topo_rng:     SimRng,
    pub(crate) cycles:       u64,
    pub(crate) total_travel: f64,
    /// The graph may disagree with the store after a failed dispatch.
    pub(crate) stale:        bool,
}

impl<S: FleetStore, P: DispatchPolicy> Session<S, P> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn graph(&self) -> &FleetGraph {
        &self.graph
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access.  Changes reach the graph on the next
    /// [`advance`](Self::advance) or [`resync`](Self::resync).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    pub fn simulator(&self) -> &FleetSimulator {
        &self.simulator
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn total_travel(&self) -> f64 {
        self.total_travel
    }

    /// `true` after a failed dispatch until the next [`resync`](Self::resync).
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ── Operations ────────────────────────────────────────────────────────

    /// One dispatch decision and its effect toward fleet charge `target`.
    ///
    /// On failure the graph may hold effects the store never committed, so
    /// the session is marked stale and [`cycle`](Self::cycle) resyncs
    /// before going on.
    pub fn step(&mut self, target: f64) -> SimResult<StepOutcome> {
        match self.dispatcher.step(&mut self.graph, &mut self.agent, &mut self.store, target) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.stale = true;
                Err(e.into())
            }
        }
    }

    /// Tick the fleet simulator for `elapsed` time units and pull the
    /// resulting changes into the graph.
    ///
    /// A stale graph is resynced first.  A failed tick leaves both the store
    /// and the graph as they were.
    pub fn advance(&mut self, elapsed: f64) -> SimResult<AdvanceReport> {
        if self.stale {
            self.resync()?;
        }
        let tick = self.simulator.tick(&mut self.store, elapsed)?;
        let reconcile = self.graph.reconcile(&mut self.store)?;
        let resynced = reconcile.needs_resync;
        if resynced {
            self.resync()?;
        }
        Ok(AdvanceReport { tick, reconcile, resynced })
    }

    /// Rebuild the graph from a full store snapshot.
    pub fn resync(&mut self) -> SimResult<()> {
        self.graph = FleetGraph::load(&mut self.store)?;
        self.stale = false;
        if !self.graph.contains(self.agent.location) {
            warn!("agent location {} vanished on resync", self.agent.location);
        }
        Ok(())
    }

    /// One full cycle: dispatch, then a tick as long as the trip took.
    pub fn cycle<O: SessionObserver>(&mut self, observer: &mut O) -> SimResult<CycleReport> {
        if self.stale {
            self.resync()?;
        }
        let cycle = self.cycles + 1;
        observer.on_cycle_start(cycle, &self.graph);

        let from = self.agent.location;
        let target = self.config.dispatch.target_charge;
        let outcome = self.step(target)?;
        self.cycles = cycle;
        self.total_travel += outcome.plan.cost;

        let advance = self.advance(outcome.plan.cost)?;
        let report = CycleReport {
            cycle,
            from,
            inventory: self.agent.inventory,
            average_charge: self.graph.average_charge(),
            total_travel: self.total_travel,
            outcome,
            advance,
        };
        observer.on_cycle_end(&report, &self.graph);
        Ok(report)
    }

    /// Repeat [`cycle`](Self::cycle) until the fleet average reaches the
    /// target, no low-charge site is left, or `max_cycles` cycles have run
    /// in this session.
    pub fn run<O: SessionObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        let target = self.config.dispatch.target_charge;
        let threshold = self.config.dispatch.low_site_threshold;
        let stop = loop {
            if self.graph.average_charge() >= target {
                break StopReason::TargetReached;
            }
            if self.graph.low_charge_sites(threshold).is_empty() {
                break StopReason::NoLowSites;
            }
            if self.cycles >= self.config.dispatch.max_cycles {
                break StopReason::MaxCycles;
            }
            self.cycle(observer)?;
        };

        let summary = RunSummary {
            cycles:        self.cycles,
            total_travel:  self.total_travel,
            final_average: self.graph.average_charge(),
            stop,
            inventory:     self.agent.inventory,
        };
        info!(
            "session stopped ({:?}) after {} cycles: average {:.2}, travel {:.2}",
            summary.stop, summary.cycles, summary.final_average, summary.total_travel,
        );
        observer.on_session_end(&summary);
        Ok(summary)
    }

    /// Wipe the store and the graph and rebuild both from a random topology.
    ///
    /// The agent restarts at the lowest-id station with a fresh refill, and
    /// the cycle and travel counters are reset.  Invalid parameters are
    /// rejected before the store is touched.  If the refill then fails, the
    /// agent waits at the new station with an empty inventory and the
    /// session is marked stale.
    pub fn regenerate(&mut self, params: &TopologyParams) -> SimResult<()> {
        let snapshot = generate(params, &mut self.topo_rng)?;
        let start = snapshot
            .nodes
            .iter()
            .filter(|r| r.node.kind() == NodeKind::Station)
            .map(|r| r.id)
            .min()
            .ok_or(SimError::NoStation)?;

        self.store.replace_all(snapshot)?;
        self.agent = Agent::new(start, 0);
        self.cycles = 0;
        self.total_travel = 0.0;
        self.stale = true;
        self.resync()?;

        let duration = self.dispatcher.recharge_duration();
        match place_agent(&mut self.graph, &mut self.store, Some(start), duration) {
            Ok(agent) => self.agent = agent,
            Err(e) => {
                self.stale = true;
                return Err(e);
            }
        }
        info!(
            "regenerated: {} stations, {} parking sites, {} vehicles",
            params.station_count, params.parking_count, params.vehicle_count,
        );
        Ok(())
    }
}

/// Put a new agent at `start`, or at the lowest-id station when `None`.  An
/// agent starting at a station refills there.
pub(crate) fn place_agent<S: FleetStore + ?Sized>(
    graph:             &mut FleetGraph,
    store:             &mut S,
    start:             Option<NodeId>,
    recharge_duration: u32,
) -> SimResult<Agent> {
    let start = match start {
        Some(id) if graph.contains(id) => id,
        Some(id) => return Err(SimError::UnknownStart(id)),
        None => graph
            .nodes_of_kind(NodeKind::Station)
            .first()
            .copied()
            .ok_or(SimError::NoStation)?,
    };
    if graph.station(start).is_none() {
        return Ok(Agent::new(start, 0));
    }
    let inventory = transact(store, |s| refill(graph, s, start, recharge_duration))?;
    info!("agent starts at {start} with {inventory} batteries");
    Ok(Agent::new(start, inventory))
}
