//! Battery allocation at a parking site and the station refill effect.

use log::{debug, warn};

use fc_core::{NodeId, ShortfallMode, StationStatus};
use fc_graph::{AttrChange, FleetGraph, SyncAdapter, FULL_CHARGE};

use crate::{DispatchError, DispatchResult};

// ── BatteryAllocator ──────────────────────────────────────────────────────────

/// Result of one allocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Allocation {
    /// Vehicles charged to full, neediest first.
    pub charged:   Vec<NodeId>,
    /// Inventory left on the agent.
    pub remaining: u32,
}

/// Tops up the neediest vehicles at a site from the agent's inventory.
#[derive(Copy, Clone, Debug, Default)]
pub struct BatteryAllocator {
    pub mode: ShortfallMode,
}

impl BatteryAllocator {
    pub fn new(mode: ShortfallMode) -> Self {
        Self { mode }
    }

    /// Charge vehicles at `site` whose charge is below `target`.
    ///
    /// With enough inventory every eligible vehicle is charged to full and
    /// inventory drops by the eligible count.  On a shortfall the behaviour
    /// depends on [`ShortfallMode`]: `ChargeAll` still charges every eligible
    /// vehicle and empties the inventory, `InventoryLimited` charges only as
    /// many as the inventory covers.
    ///
    /// Each vehicle write goes through the fleet graph; the caller owns the
    /// transaction boundary.
    pub fn allocate<A: SyncAdapter + ?Sized>(
        &self,
        graph:     &mut FleetGraph,
        adapter:   &mut A,
        site:      NodeId,
        target:    f64,
        inventory: u32,
    ) -> DispatchResult<Allocation> {
        let eligible = graph.vehicles_below(site, target);
        let wanted = u32::try_from(eligible.len()).unwrap_or(u32::MAX);

        let (count, remaining) = if inventory >= wanted {
            (eligible.len(), inventory - wanted)
        } else {
            match self.mode {
                ShortfallMode::ChargeAll => {
                    warn!(
                        "{site}: {wanted} vehicles eligible but only {inventory} batteries; charging all",
                    );
                    (eligible.len(), 0)
                }
                ShortfallMode::InventoryLimited => (inventory as usize, 0),
            }
        };

        let mut charged = Vec::with_capacity(count);
        for &(vehicle, _) in &eligible[..count] {
            graph.update_attributes(vehicle, &[AttrChange::Charge(FULL_CHARGE)], adapter)?;
            charged.push(vehicle);
        }

        debug!("{site}: charged {} of {} eligible, {remaining} batteries left", charged.len(), eligible.len());
        Ok(Allocation { charged, remaining })
    }
}

// ── Refill ────────────────────────────────────────────────────────────────────

/// Refill the agent at `station`: the station starts its recharge countdown
/// and the agent's new inventory (the station's capacity) is returned.
pub fn refill<A: SyncAdapter + ?Sized>(
    graph:             &mut FleetGraph,
    adapter:           &mut A,
    station:           NodeId,
    recharge_duration: u32,
) -> DispatchResult<u32> {
    let capacity = graph
        .station(station)
        .ok_or(DispatchError::NotAStation(station))?
        .capacity;
    graph.update_attributes(
        station,
        &[
            AttrChange::Status(StationStatus::Charging),
            AttrChange::TimeRemaining(recharge_duration),
        ],
        adapter,
    )?;
    debug!("{station}: refilled {capacity} batteries, busy for {recharge_duration}");
    Ok(capacity)
}
