//! The mobile charging agent.

use fc_core::NodeId;

/// The single charging agent of a session.
///
/// Holds only ids into the fleet graph, never references.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    /// Station or parking site the agent currently stands at.
    pub location:  NodeId,
    /// Charged batteries carried.
    pub inventory: u32,
}

impl Agent {
    pub fn new(location: NodeId, inventory: u32) -> Self {
        Self { location, inventory }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inventory == 0
    }

    #[inline]
    pub fn move_to(&mut self, destination: NodeId) {
        self.location = destination;
    }
}
