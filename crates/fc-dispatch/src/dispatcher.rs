//! One dispatch cycle: decide, apply the arrival effect, move the agent.

use log::info;

use fc_core::ShortfallMode;
use fc_graph::{transact, FleetGraph, SyncAdapter};

use crate::allocator::refill;
use crate::{Action, Agent, BatteryAllocator, DispatchPolicy, DispatchResult, Plan};

/// What happened on arrival.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// The agent refilled to this many batteries.
    Refilled(u32),
    /// These vehicles were charged to full.
    Charged(Vec<fc_core::NodeId>),
}

/// Result of [`Dispatcher::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub plan:   Plan,
    pub effect: Effect,
}

impl StepOutcome {
    /// Number of vehicles charged this cycle.
    pub fn charged_count(&self) -> usize {
        match &self.effect {
            Effect::Charged(ids) => ids.len(),
            Effect::Refilled(_) => 0,
        }
    }
}

/// Couples a [`DispatchPolicy`] with the arrival effects.
pub struct Dispatcher<P: DispatchPolicy> {
    policy:            P,
    allocator:         BatteryAllocator,
    recharge_duration: u32,
}

impl<P: DispatchPolicy> Dispatcher<P> {
    pub fn new(policy: P, shortfall_mode: ShortfallMode, recharge_duration: u32) -> Self {
        Self {
            policy,
            allocator: BatteryAllocator::new(shortfall_mode),
            recharge_duration,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn recharge_duration(&self) -> u32 {
        self.recharge_duration
    }

    /// Run one dispatch cycle toward fleet charge `target`.
    ///
    /// The effect's store writes form one transaction.  On a failed commit
    /// the agent is left where it was and the graph must be resynced.
    pub fn step<A: SyncAdapter + ?Sized>(
        &self,
        graph:   &mut FleetGraph,
        agent:   &mut Agent,
        adapter: &mut A,
        target:  f64,
    ) -> DispatchResult<StepOutcome> {
        let plan = self.policy.plan(graph, agent, target)?;

        let effect = match plan.action {
            Action::Refill { station } => {
                let duration = self.recharge_duration;
                let inventory = transact(adapter, |a| refill(graph, a, station, duration))?;
                agent.inventory = inventory;
                Effect::Refilled(inventory)
            }
            Action::Allocate { site } => {
                let inventory = agent.inventory;
                let allocation = transact(adapter, |a| {
                    self.allocator.allocate(graph, a, site, target, inventory)
                })?;
                agent.inventory = allocation.remaining;
                Effect::Charged(allocation.charged)
            }
        };

        agent.move_to(plan.destination);
        info!(
            "agent at {} with {} batteries after {:?}",
            agent.location, agent.inventory, plan.action,
        );
        Ok(StepOutcome { plan, effect })
    }
}
