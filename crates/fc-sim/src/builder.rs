//! Fluent builder for constructing a [`Session`].

use log::info;

use fc_core::{FleetConfig, NodeId, SimRng};
use fc_dispatch::{DispatchPolicy, Dispatcher, NearestFirstPolicy};
use fc_graph::{FleetGraph, FleetStore};

use crate::session::place_agent;
use crate::topology::{generate, static_layout, TopologyParams};
use crate::{FleetSimulator, Session, SimResult};

/// Where the session's initial topology comes from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TopologySource {
    /// Whatever the store already holds.
    #[default]
    Existing,
    /// The fixed demo layout.
    Static,
    /// A random topology; the store is wiped first.
    Generated(TopologyParams),
}

/// Fluent builder for [`Session<S, P>`].
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                                              |
/// |-----------------|------------------------------------------------------|
/// | `.policy(p)`    | `NearestFirstPolicy` with the configured threshold   |
/// | `.topology(t)`  | `TopologySource::Existing`                           |
/// | `.start_at(id)` | Lowest-id station                                    |
///
/// # Seeding
///
/// The root `SimRng` is seeded from `config.seed`.  Topology generation
/// uses child stream 1 and fleet churn child stream 2, so the same seed
/// always yields the same topology and the same churn sequence.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = SessionBuilder::new(config, MemoryStore::new())
///     .topology(TopologySource::Static)
///     .build()?;
/// let summary = session.run(&mut NoopObserver)?;
/// ```
pub struct SessionBuilder<S: FleetStore, P: DispatchPolicy = NearestFirstPolicy> {
    config:   FleetConfig,
    store:    S,
    policy:   P,
    topology: TopologySource,
    start:    Option<NodeId>,
}

impl<S: FleetStore> SessionBuilder<S, NearestFirstPolicy> {
    pub fn new(config: FleetConfig, store: S) -> Self {
        let policy = NearestFirstPolicy::new(config.dispatch.low_site_threshold);
        Self { config, store, policy, topology: TopologySource::Existing, start: None }
    }
}

impl<S: FleetStore, P: DispatchPolicy> SessionBuilder<S, P> {
    /// Replace the dispatch policy.
    pub fn policy<Q: DispatchPolicy>(self, policy: Q) -> SessionBuilder<S, Q> {
        SessionBuilder {
            config:   self.config,
            store:    self.store,
            policy,
            topology: self.topology,
            start:    self.start,
        }
    }

    pub fn topology(mut self, source: TopologySource) -> Self {
        self.topology = source;
        self
    }

    /// Start the agent at `node` instead of the lowest-id station.  A
    /// non-station start begins with an empty inventory.
    pub fn start_at(mut self, node: NodeId) -> Self {
        self.start = Some(node);
        self
    }

    /// Validate the config, populate the store, load the graph, and place the
    /// agent.
    pub fn build(self) -> SimResult<Session<S, P>> {
        self.config.validate()?;
        let mut store = self.store;

        let mut root = SimRng::new(self.config.seed);
        let mut topo_rng = root.child(1);
        let churn_rng = root.child(2);

        match &self.topology {
            TopologySource::Existing => {}
            TopologySource::Static => store.replace_all(static_layout(&mut topo_rng))?,
            TopologySource::Generated(params) => store.replace_all(generate(params, &mut topo_rng)?)?,
        }

        let mut graph = FleetGraph::load(&mut store)?;
        let recharge_duration = self.config.dispatch.recharge_duration;
        let agent = place_agent(&mut graph, &mut store, self.start, recharge_duration)?;
        let simulator = FleetSimulator::new(self.config.churn.clone(), churn_rng)?;
        let dispatcher = Dispatcher::new(self.policy, self.config.dispatch.shortfall_mode, recharge_duration);

        info!(
            "session ready: {} nodes, {} vehicles, average charge {:.2}",
            graph.len(),
            graph.vehicle_count(),
            graph.average_charge(),
        );

        Ok(Session {
            config: self.config,
            graph,
            agent,
            store,
            dispatcher,
            simulator,
            topo_rng,
            cycles: 0,
            total_travel: 0.0,
            stale: false,
        })
    }
}
