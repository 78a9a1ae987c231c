//! Simulation configuration.
//!
//! Loaded from a TOML file by the application crate.  Every field has a
//! default, so an empty file (or no file at all) yields a runnable setup:
//!
//! ```toml
//! seed = 7
//!
//! [dispatch]
//! target_charge      = 80.0
//! low_site_threshold = 80.0
//!
//! [churn]
//! discharge_per_tick = 0.4
//!
//! [topology]
//! station_count = 10
//! parking_count = 40
//! vehicle_count = 150
//! area_size     = 1000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

// ── FleetConfig ───────────────────────────────────────────────────────────────

/// Top-level configuration for one simulation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    pub dispatch: DispatchConfig,

    pub churn: ChurnConfig,

    pub topology: TopologyConfig,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            seed:     42,
            dispatch: DispatchConfig::default(),
            churn:    ChurnConfig::default(),
            topology: TopologyConfig::default(),
        }
    }
}

impl FleetConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config: FleetConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations the simulator cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        let d = &self.dispatch;
        if !(0.0..=100.0).contains(&d.target_charge) {
            return Err(CoreError::Config(format!(
                "dispatch.target_charge must be in [0, 100], got {}",
                d.target_charge
            )));
        }
        if !(0.0..=100.0).contains(&d.low_site_threshold) {
            return Err(CoreError::Config(format!(
                "dispatch.low_site_threshold must be in [0, 100], got {}",
                d.low_site_threshold
            )));
        }

        let c = &self.churn;
        if !c.discharge_per_tick.is_finite() || c.discharge_per_tick < 0.0 {
            return Err(CoreError::Config(format!(
                "churn.discharge_per_tick must be a non-negative number, got {}",
                c.discharge_per_tick
            )));
        }
        if c.relocate_weight + c.remove_weight + c.add_weight == 0 {
            return Err(CoreError::Config("churn weights must not all be zero".into()));
        }
        if c.new_charge_min > c.new_charge_max || c.new_charge_max > 100 {
            return Err(CoreError::Config(format!(
                "churn new-vehicle charge range {}..={} is invalid",
                c.new_charge_min, c.new_charge_max
            )));
        }

        let t = &self.topology;
        if t.area_size == 0 {
            return Err(CoreError::Config("topology.area_size must be positive".into()));
        }
        if t.parking_capacities.is_empty() {
            return Err(CoreError::Config("topology.parking_capacities must not be empty".into()));
        }
        if t.station_count == 0 {
            return Err(CoreError::Config("topology.station_count must be positive".into()));
        }
        if t.vehicle_count > 0 && t.parking_count == 0 {
            return Err(CoreError::Config("vehicles need at least one parking site".into()));
        }
        Ok(())
    }
}

// ── Sections ──────────────────────────────────────────────────────────────────

/// Behaviour of the battery allocator when the agent carries fewer batteries
/// than there are eligible vehicles at a site.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallMode {
    /// Every eligible vehicle is charged to 100 and the inventory is zeroed,
    /// even though the agent carried fewer batteries than it handed out.
    #[default]
    ChargeAll,
    /// Only as many vehicles as the inventory allows are charged, neediest
    /// first.
    InventoryLimited,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Fleet-wide average charge at which the driving loop stops.  Also the
    /// per-vehicle level below which the allocator tops a vehicle up.
    pub target_charge: f64,

    /// Parking sites whose mean charge is below this value are distribution
    /// candidates.
    pub low_site_threshold: f64,

    /// Time a station needs after a refill before it is ready again.
    pub recharge_duration: u32,

    pub shortfall_mode: ShortfallMode,

    /// Upper bound on dispatch cycles per `Session::run`.
    pub max_cycles: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            target_charge:      80.0,
            low_site_threshold: 80.0,
            recharge_duration:  30,
            shortfall_mode:     ShortfallMode::ChargeAll,
            max_cycles:         1_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Charge lost by every vehicle per tick.  No floor is applied.
    pub discharge_per_tick: f64,

    /// Disable to freeze fleet composition (discharge and countdown still run).
    pub enabled: bool,

    /// Lower bound of the random per-tick action count.
    pub min_actions: usize,

    pub relocate_weight: u32,
    pub remove_weight:   u32,
    pub add_weight:      u32,

    /// Inclusive range for the charge of vehicles added by churn.
    pub new_charge_min: u32,
    pub new_charge_max: u32,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            discharge_per_tick: 0.4,
            enabled:            true,
            min_actions:        3,
            relocate_weight:    45,
            remove_weight:      35,
            add_weight:         30,
            new_charge_min:     45,
            new_charge_max:     100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub station_count: usize,
    pub parking_count: usize,
    pub vehicle_count: usize,

    /// Side length of the square service area.
    pub area_size: u32,

    /// Battery slots per generated station.
    pub station_capacity: u32,

    /// Capacities drawn uniformly for generated parking sites.
    pub parking_capacities: Vec<u32>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            station_count:      10,
            parking_count:      40,
            vehicle_count:      150,
            area_size:          1_000,
            station_capacity:   20,
            parking_capacities: vec![5, 10, 15, 20],
        }
    }
}
