//! Fleet state evolution between dispatch cycles.
//!
//! One [`FleetSimulator::tick`] applies, in order:
//!
//! 1. **Discharge**: every vehicle loses `discharge_per_tick`, without a floor.
//! 2. **Churn**: a random number of actions in `[min_actions, fleet size]`,
//!    each drawn by weight from relocate / remove / add.  Skipped for an
//!    empty fleet.
//! 3. **Countdown**: every charging station's remaining time drops by the
//!    elapsed time; stations that reach zero become ready.
//!
//! All writes go to the backing store inside one transaction.  The fleet
//! graph picks them up afterwards through [`fc_graph::FleetGraph::reconcile`].

use log::{debug, warn};
use rand::distributions::{Distribution, WeightedIndex};

use fc_core::{ChurnConfig, NodeId, SimRng, StationStatus};
use fc_graph::{transact, AttrChange, FleetStore, SyncError, SyncResult, Vehicle, WriteTarget};

use crate::{SimError, SimResult};

// ── Reports ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChurnKind {
    Relocate,
    Remove,
    Add,
}

impl ChurnKind {
    /// Order matches the weight order in [`ChurnConfig`].
    pub const ALL: [ChurnKind; 3] = [ChurnKind::Relocate, ChurnKind::Remove, ChurnKind::Add];
}

/// One applied churn action.
#[derive(Clone, Debug, PartialEq)]
pub enum ChurnAction {
    Relocate { vehicle: NodeId, from: NodeId, to: NodeId },
    Remove { vehicle: NodeId },
    Add { vehicle: NodeId, site: NodeId, charge: f64 },
}

impl ChurnAction {
    pub fn kind(&self) -> ChurnKind {
        match self {
            ChurnAction::Relocate { .. } => ChurnKind::Relocate,
            ChurnAction::Remove { .. }   => ChurnKind::Remove,
            ChurnAction::Add { .. }      => ChurnKind::Add,
        }
    }
}

/// What one tick changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub elapsed:           f64,
    pub discharged:        usize,
    pub actions:           Vec<ChurnAction>,
    /// Stations whose countdown reached zero this tick.
    pub stations_ready:    Vec<NodeId>,
    /// Stations still charging after the countdown.
    pub stations_counting: usize,
}

// ── FleetSimulator ────────────────────────────────────────────────────────────

pub struct FleetSimulator {
    config:  ChurnConfig,
    weights: WeightedIndex<u32>,
    rng:     SimRng,
    /// Vehicles added by churn so far; used for naming.
    spawned: u64,
}

impl FleetSimulator {
    /// `rng` should be a dedicated child stream so churn draws never shift
    /// other random sequences.
    pub fn new(config: ChurnConfig, rng: SimRng) -> SimResult<Self> {
        let weights = WeightedIndex::new([config.relocate_weight, config.remove_weight, config.add_weight])
            .map_err(|e| SimError::Config(format!("churn weights: {e}")))?;
        Ok(Self { config, weights, rng, spawned: 0 })
    }

    pub fn config(&self) -> &ChurnConfig {
        &self.config
    }

    /// Advance the store by one tick of `elapsed` time units.
    ///
    /// Fails with [`SimError::TickFailed`] if any write or the commit fails;
    /// the store is then rolled back to its state before the tick.
    pub fn tick<S: FleetStore + ?Sized>(&mut self, store: &mut S, elapsed: f64) -> SimResult<TickReport> {
        let elapsed = elapsed.max(0.0);
        let result: Result<TickReport, SyncError> = transact(store, |s| self.apply(s, elapsed));
        let report = result.map_err(SimError::TickFailed)?;
        debug!(
            "tick: {} discharged, {} churn actions, {} stations ready, {} still charging",
            report.discharged,
            report.actions.len(),
            report.stations_ready.len(),
            report.stations_counting,
        );
        Ok(report)
    }

    fn apply<S: FleetStore + ?Sized>(&mut self, store: &mut S, elapsed: f64) -> SyncResult<TickReport> {
        let discharged = self.discharge(store)?;
        let actions = self.churn(store)?;
        let (stations_ready, stations_counting) = countdown(store, elapsed)?;
        Ok(TickReport { elapsed, discharged, actions, stations_ready, stations_counting })
    }

    // ── Discharge ─────────────────────────────────────────────────────────

    fn discharge<S: FleetStore + ?Sized>(&self, store: &mut S) -> SyncResult<usize> {
        let mut count = 0;
        for id in store.vehicle_ids() {
            if let Some(vehicle) = store.vehicle(id) {
                let charge = vehicle.charge - self.config.discharge_per_tick;
                store.write(WriteTarget::Vehicle, id, &[AttrChange::Charge(charge)])?;
                count += 1;
            }
        }
        Ok(count)
    }

    // ── Churn ─────────────────────────────────────────────────────────────

    fn churn<S: FleetStore + ?Sized>(&mut self, store: &mut S) -> SyncResult<Vec<ChurnAction>> {
        let fleet = store.vehicle_ids().len();
        if !self.config.enabled || fleet == 0 {
            return Ok(Vec::new());
        }

        let count = self.rng.gen_range(self.config.min_actions.min(fleet)..=fleet);
        let mut actions = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = ChurnKind::ALL[self.weights.sample(self.rng.inner())];
            match self.churn_once(store, kind)? {
                Some(action) => actions.push(action),
                None => warn!("churn {kind:?} skipped: no eligible vehicle or site"),
            }
        }
        Ok(actions)
    }

    fn churn_once<S: FleetStore + ?Sized>(
        &mut self,
        store: &mut S,
        kind:  ChurnKind,
    ) -> SyncResult<Option<ChurnAction>> {
        match kind {
            ChurnKind::Relocate => {
                let Some(vehicle) = self.pick(&store.vehicle_ids()) else { return Ok(None) };
                let Some(from) = store.vehicle(vehicle).map(|v| v.site) else { return Ok(None) };
                let sites: Vec<NodeId> = store.parking_ids().into_iter().filter(|&s| s != from).collect();
                let Some(to) = self.pick(&sites) else { return Ok(None) };
                store.write(WriteTarget::Vehicle, vehicle, &[AttrChange::Site(to)])?;
                Ok(Some(ChurnAction::Relocate { vehicle, from, to }))
            }
            ChurnKind::Remove => {
                let Some(vehicle) = self.pick(&store.vehicle_ids()) else { return Ok(None) };
                store.delete_vehicle(vehicle)?;
                Ok(Some(ChurnAction::Remove { vehicle }))
            }
            ChurnKind::Add => {
                let Some(site) = self.pick(&store.parking_ids()) else { return Ok(None) };
                let charge = f64::from(self.rng.gen_range(self.config.new_charge_min..=self.config.new_charge_max));
                self.spawned += 1;
                let vehicle = store.insert_vehicle(Vehicle::new(format!("Spawned {}", self.spawned), charge, site))?;
                Ok(Some(ChurnAction::Add { vehicle, site, charge }))
            }
        }
    }

    fn pick(&mut self, ids: &[NodeId]) -> Option<NodeId> {
        self.rng.choose(ids).copied()
    }
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// Count down every charging station by `elapsed`.  Remaining time is kept
/// whole by rounding up.  Returns the stations that became ready and the
/// number still charging.
fn countdown<S: FleetStore + ?Sized>(store: &mut S, elapsed: f64) -> SyncResult<(Vec<NodeId>, usize)> {
    let mut ready = Vec::new();
    let mut counting = 0;
    for (id, station) in store.charging_stations() {
        let remaining = f64::from(station.time_remaining);
        if remaining <= elapsed {
            store.write(
                WriteTarget::Station,
                id,
                &[AttrChange::TimeRemaining(0), AttrChange::Status(StationStatus::Ready)],
            )?;
            ready.push(id);
        } else {
            let left = (remaining - elapsed).ceil() as u32;
            if left != station.time_remaining {
                store.write(WriteTarget::Station, id, &[AttrChange::TimeRemaining(left)])?;
            }
            counting += 1;
        }
    }
    Ok((ready, counting))
}
