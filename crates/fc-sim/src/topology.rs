//! Topology generation.
//!
//! Two sources are provided:
//!
//! * [`generate`]: random stations, parking sites and vehicles on a square
//!   area, with a travel edge between every pair of routable nodes.
//! * [`static_layout`]: a fixed demo town of two stations and six parking
//!   sites, useful for walkthroughs and regression tests.
//!
//! Both draw every random value from the `SimRng` they are given.

use rand::distributions::{Distribution, WeightedIndex};

use fc_core::{NodeId, Position, SimRng, TopologyConfig};
use fc_graph::{EdgeRecord, Node, NodeRecord, ParkingSite, Snapshot, Station, Vehicle};

use crate::{SimError, SimResult};

/// Lowest initial charge of a generated vehicle.
const INITIAL_CHARGE_MIN: u32 = 45;

/// Number of initial charge levels with a positive weight: level
/// `INITIAL_CHARGE_MIN + i` has weight `100 - 3i`.
const INITIAL_CHARGE_LEVELS: u32 = 34;

/// Capacity used for every node of the static layout.
const STATIC_CAPACITY: u32 = 5;

// ── Parameters ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct TopologyParams {
    pub station_count:      usize,
    pub parking_count:      usize,
    pub vehicle_count:      usize,
    pub area_size:          u32,
    pub station_capacity:   u32,
    pub parking_capacities: Vec<u32>,
}

impl From<&TopologyConfig> for TopologyParams {
    fn from(c: &TopologyConfig) -> Self {
        Self {
            station_count:      c.station_count,
            parking_count:      c.parking_count,
            vehicle_count:      c.vehicle_count,
            area_size:          c.area_size,
            station_capacity:   c.station_capacity,
            parking_capacities: c.parking_capacities.clone(),
        }
    }
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self::from(&TopologyConfig::default())
    }
}

impl TopologyParams {
    /// Reject parameters that cannot yield a runnable topology.  Checked
    /// before any random draw.
    pub fn validate(&self) -> SimResult<()> {
        if self.station_count == 0 {
            return Err(SimError::Config("a topology needs at least one station".into()));
        }
        if self.vehicle_count > 0 && self.parking_count == 0 {
            return Err(SimError::Config("vehicles need at least one parking site".into()));
        }
        if self.parking_count > 0 && self.parking_capacities.is_empty() {
            return Err(SimError::Config("no parking capacities to choose from".into()));
        }
        Ok(())
    }
}

// ── Travel time ───────────────────────────────────────────────────────────────

/// Travel time between two positions for a uniform draw `u ∈ [0, 1)`:
///
/// ```text
/// round2(d / 8.5 + ((u · 1000) mod d) / 2.5 · 4)
/// ```
///
/// where `d` is the Euclidean distance.  Coincident positions give zero.
pub fn travel_time(a: Position, b: Position, u: f64) -> f64 {
    let d = a.distance(b);
    let base = d / 8.5;
    let jitter = if d > 0.0 { (u * 1_000.0) % d / 2.5 * 4.0 } else { 0.0 };
    ((base + jitter) * 100.0).round() / 100.0
}

/// Initial charge of a generated vehicle, weighted toward low levels.
pub fn initial_charge(rng: &mut SimRng) -> f64 {
    // Weights are all positive, so construction cannot fail.
    match WeightedIndex::new((0..INITIAL_CHARGE_LEVELS).map(|i| 100 - 3 * i)) {
        Ok(weights) => f64::from(INITIAL_CHARGE_MIN + weights.sample(rng.inner()) as u32),
        Err(_) => f64::from(INITIAL_CHARGE_MIN),
    }
}

// ── Assembly ──────────────────────────────────────────────────────────────────

/// Accumulates records with sequential ids starting at 1.
struct LayoutBuilder {
    nodes:    Vec<NodeRecord>,
    routable: Vec<(NodeId, Position)>,
    next_id:  u32,
}

impl LayoutBuilder {
    fn new() -> Self {
        Self { nodes: Vec::new(), routable: Vec::new(), next_id: 1 }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        if let Some(pos) = node.position() {
            self.routable.push((id, pos));
        }
        self.nodes.push(NodeRecord::new(id, node));
        id
    }

    /// Connect every pair of routable nodes.
    fn finish(self, rng: &mut SimRng) -> Snapshot {
        let mut edges = Vec::with_capacity(self.routable.len() * self.routable.len().saturating_sub(1) / 2);
        for (i, &(a, pa)) in self.routable.iter().enumerate() {
            for &(b, pb) in &self.routable[i + 1..] {
                let u: f64 = rng.random();
                edges.push(EdgeRecord { a, b, travel_time: travel_time(pa, pb, u) });
            }
        }
        Snapshot { nodes: self.nodes, edges }
    }
}

/// Random topology for `params`.
///
/// Positions are whole numbers in `[0, area_size]²`.  Each vehicle is placed
/// at a uniformly chosen parking site.
pub fn generate(params: &TopologyParams, rng: &mut SimRng) -> SimResult<Snapshot> {
    params.validate()?;

    let mut layout = LayoutBuilder::new();
    let random_position = |rng: &mut SimRng| {
        Position::new(
            f64::from(rng.gen_range(0..=params.area_size)),
            f64::from(rng.gen_range(0..=params.area_size)),
        )
    };

    let mut sites = Vec::with_capacity(params.parking_count);
    for i in 1..=params.parking_count {
        let position = random_position(rng);
        let capacity = rng.choose(&params.parking_capacities).copied().unwrap_or(STATIC_CAPACITY);
        sites.push(layout.push(Node::Parking(ParkingSite::new(format!("Parking {i}"), position, capacity))));
    }
    for i in 1..=params.station_count {
        let position = random_position(rng);
        layout.push(Node::Station(Station::new(format!("Station {i}"), position, params.station_capacity)));
    }
    for i in 1..=params.vehicle_count {
        let Some(&site) = rng.choose(&sites) else { break };
        let charge = initial_charge(rng);
        layout.push(Node::Vehicle(Vehicle::new(format!("Vehicle {i}"), charge, site)));
    }

    Ok(layout.finish(rng))
}

/// Fixed demo layout: two stations, six parking sites, five vehicles at
/// "Parking 1" and ten at "Parking 2".  Only vehicle charges and travel
/// times are random.  "Station 1" gets the lowest id.
pub fn static_layout(rng: &mut SimRng) -> Snapshot {
    let mut layout = LayoutBuilder::new();
    let station = |name: &str, lat: f64, lon: f64| {
        Node::Station(Station::new(name, Position::new(lat, lon), STATIC_CAPACITY))
    };
    let parking = |name: &str, lat: f64, lon: f64| {
        Node::Parking(ParkingSite::new(name, Position::new(lat, lon), STATIC_CAPACITY))
    };

    layout.push(station("Station 1", 0.0, 0.0));
    let first = layout.push(parking("Parking 1", 20.0, 0.0));
    let second = layout.push(parking("Parking 2", 40.0, 35.0));
    layout.push(parking("Parking 3", 15.0, 2.0));
    layout.push(parking("Parking 4", 12.0, 16.0));
    layout.push(parking("Parking 5", 34.0, 10.0));
    layout.push(parking("Parking 6", 0.0, 22.0));
    layout.push(station("Station 2", 10.0, 10.0));

    let mut n = 0;
    for (site, count) in [(first, 5), (second, 10)] {
        for _ in 0..count {
            n += 1;
            let charge = initial_charge(rng);
            layout.push(Node::Vehicle(Vehicle::new(format!("Vehicle {n}"), charge, site)));
        }
    }

    layout.finish(rng)
}
