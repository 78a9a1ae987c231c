//! `fc-dispatch`: where the charging agent goes and what it does there.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`agent`]      | `Agent` (location + battery inventory)                   |
//! | [`plan`]       | `Plan`, `Action`                                         |
//! | [`policy`]     | `DispatchPolicy` trait, `NearestFirstPolicy`             |
//! | [`allocator`]  | `BatteryAllocator`, `Allocation`, `refill`               |
//! | [`dispatcher`] | `Dispatcher::step`, `StepOutcome`, `Effect`              |
//! | [`heuristic`]  | `station_desirability` (diagnostic only)                 |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                     |
//!
//! # Cycle
//!
//! 1. The policy reads the graph and returns a [`Plan`].
//! 2. The dispatcher applies the plan's [`Action`] inside one store
//!    transaction: a refill at a station, an allocation at a parking site.
//! 3. The agent moves to the plan's destination.

pub mod agent;
pub mod allocator;
pub mod dispatcher;
pub mod error;
pub mod heuristic;
pub mod plan;
pub mod policy;


pub use agent::Agent;
pub use allocator::{refill, Allocation, BatteryAllocator};
pub use dispatcher::{Dispatcher, Effect, StepOutcome};
pub use error::{DispatchError, DispatchResult};
pub use heuristic::station_desirability;
pub use plan::{Action, Plan};
pub use policy::{DispatchPolicy, NearestFirstPolicy};
