//! Node kind discriminant and station status.

use serde::{Deserialize, Serialize};

/// The three kinds of node in a fleet topology.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Charging station: refills the agent's battery inventory.
    Station,
    /// Parking site: vehicles rest here and are serviced in place.
    Parking,
    /// Vehicle: a leaf attached to exactly one parking site.
    Vehicle,
}

impl NodeKind {
    /// `true` for kinds that take part in routing.  Vehicles are leaves and
    /// never appear on a route.
    #[inline]
    pub fn is_routable(self) -> bool {
        !matches!(self, NodeKind::Vehicle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Station => "station",
            NodeKind::Parking => "parking",
            NodeKind::Vehicle => "vehicle",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charging-station state machine.
///
/// `Ready → Charging` when the agent refills there; `Charging → Ready` once
/// the station's countdown reaches zero.  `Empty` is reported by the store
/// for stations out of service and is never entered by the simulator.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    #[default]
    Ready,
    Charging,
    Empty,
}

impl StationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StationStatus::Ready    => "ready",
            StationStatus::Charging => "charging",
            StationStatus::Empty    => "empty",
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
