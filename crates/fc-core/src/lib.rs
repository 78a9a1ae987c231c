//! `fc-core`: foundational types for the `fleet_dt` charging simulator.
//!
//! This crate is a dependency of every other `fc-*` crate.  It has no `fc-*`
//! dependencies and only a handful of external ones (`rand`, `thiserror`,
//! `serde`, `toml`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`ids`]      | `NodeId`, `EdgeId`                                        |
//! | [`geo`]      | `Position`, planar distance                               |
//! | [`kind`]     | `NodeKind`, `StationStatus`                               |
//! | [`rng`]      | `SimRng` (seedable, forkable)                             |
//! | [`config`]   | `FleetConfig` and its TOML sections                       |
//! | [`error`]    | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod kind;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ChurnConfig, DispatchConfig, FleetConfig, ShortfallMode, TopologyConfig};
pub use error::{CoreError, CoreResult};
pub use geo::Position;
pub use ids::{EdgeId, NodeId};
pub use kind::{NodeKind, StationStatus};
pub use rng::SimRng;
