//! Dispatch plans: where the agent goes next and what it does on arrival.

use fc_core::NodeId;
use fc_spatial::Route;

/// Effect applied when the agent reaches its destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Refill inventory at a station and start its recharge countdown.
    Refill { station: NodeId },
    /// Run the battery allocator at a parking site.
    Allocate { site: NodeId },
}

/// The outcome of one policy decision.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    /// Nodes visited, from the agent's location to `destination`.
    pub path:        Vec<NodeId>,
    pub destination: NodeId,
    /// Travel time, plus the station's remaining charge time for refills.
    pub cost:        f64,
    pub action:      Action,
}

impl Plan {
    pub fn from_route(route: Route, destination: NodeId, action: Action) -> Self {
        Self { path: route.nodes, destination, cost: route.cost, action }
    }
}
