//! Typed node records and attribute changes.

use fc_core::{NodeId, NodeKind, Position, StationStatus};

// ── Records ───────────────────────────────────────────────────────────────────

/// Charging station where the agent refills its battery inventory.
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub name:           String,
    pub position:       Position,
    /// Battery slots; the agent's inventory after a refill.
    pub capacity:       u32,
    pub status:         StationStatus,
    /// Time units until the station is ready again.  Zero when ready.
    pub time_remaining: u32,
}

impl Station {
    pub fn new(name: impl Into<String>, position: Position, capacity: u32) -> Self {
        Self {
            name: name.into(),
            position,
            capacity,
            status: StationStatus::Ready,
            time_remaining: 0,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.status == StationStatus::Ready
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParkingSite {
    pub name:     String,
    pub position: Position,
    pub capacity: u32,
}

impl ParkingSite {
    pub fn new(name: impl Into<String>, position: Position, capacity: u32) -> Self {
        Self { name: name.into(), position, capacity }
    }
}

/// A vehicle parked at exactly one parking site.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub name:   String,
    /// Charge level in percent.  Discharge has no floor, so this may drop
    /// below zero in long runs.
    pub charge: f64,
    pub site:   NodeId,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, charge: f64, site: NodeId) -> Self {
        Self { name: name.into(), charge, site }
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// Closed set of node records, discriminated by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Station(Station),
    Parking(ParkingSite),
    Vehicle(Vehicle),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Station(_) => NodeKind::Station,
            Node::Parking(_) => NodeKind::Parking,
            Node::Vehicle(_) => NodeKind::Vehicle,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Station(s) => &s.name,
            Node::Parking(p) => &p.name,
            Node::Vehicle(v) => &v.name,
        }
    }

    /// Position of routable nodes.  Vehicles take their site's position and
    /// report `None` here.
    pub fn position(&self) -> Option<Position> {
        match self {
            Node::Station(s) => Some(s.position),
            Node::Parking(p) => Some(p.position),
            Node::Vehicle(_) => None,
        }
    }

    pub fn as_station(&self) -> Option<&Station> {
        match self {
            Node::Station(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_parking(&self) -> Option<&ParkingSite> {
        match self {
            Node::Parking(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_vehicle(&self) -> Option<&Vehicle> {
        match self {
            Node::Vehicle(v) => Some(v),
            _ => None,
        }
    }
}

// ── Attribute changes ─────────────────────────────────────────────────────────

/// One attribute update on an existing node.
///
/// Changes are validated against the node's kind before anything is mutated;
/// see [`AttrChange::applies_to`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AttrChange {
    /// Vehicle charge level.
    Charge(f64),
    /// Vehicle's owning parking site.
    Site(NodeId),
    /// Station status.
    Status(StationStatus),
    /// Station countdown.
    TimeRemaining(u32),
}

impl AttrChange {
    pub fn name(self) -> &'static str {
        match self {
            AttrChange::Charge(_)        => "charge",
            AttrChange::Site(_)          => "site",
            AttrChange::Status(_)        => "status",
            AttrChange::TimeRemaining(_) => "time_remaining",
        }
    }

    pub fn applies_to(self, kind: NodeKind) -> bool {
        matches!(
            (self, kind),
            (AttrChange::Charge(_) | AttrChange::Site(_), NodeKind::Vehicle)
                | (AttrChange::Status(_) | AttrChange::TimeRemaining(_), NodeKind::Station)
        )
    }

    /// Write the change into `node`.  Returns `false` (leaving `node`
    /// untouched) when the change does not apply to its kind.
    pub fn apply(self, node: &mut Node) -> bool {
        match (self, node) {
            (AttrChange::Charge(c), Node::Vehicle(v))        => v.charge = c,
            (AttrChange::Site(s), Node::Vehicle(v))          => v.site = s,
            (AttrChange::Status(s), Node::Station(st))       => st.status = s,
            (AttrChange::TimeRemaining(t), Node::Station(st)) => st.time_remaining = t,
            _ => return false,
        }
        true
    }
}
