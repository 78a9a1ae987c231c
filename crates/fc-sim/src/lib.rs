//! `fc-sim`: fleet evolution and the session driving loop.
//!
//! # Session cycle
//!
//! ```text
//! while fleet average < target and a low-charge site exists:
//!   ① Dispatch : the policy picks a destination; the arrival effect
//!                 (refill or battery allocation) commits to the store.
//!   ② Tick     : FleetSimulator discharges vehicles, applies churn and
//!                 counts down station timers, for as long as the trip took.
//!   ③ Reconcile: the fleet graph pulls the store's vehicle and station
//!                 deltas; station additions or removals force a resync.
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`simulator`] | `FleetSimulator`, `TickReport`, `ChurnAction`            |
//! | [`topology`]  | `generate`, `static_layout`, `travel_time`               |
//! | [`session`]   | `Session`, `CycleReport`, `RunSummary`, `StopReason`     |
//! | [`builder`]   | `SessionBuilder`, `TopologySource`                       |
//! | [`observer`]  | `SessionObserver`, `NoopObserver`                        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use fc_core::FleetConfig;
//! use fc_sim::{NoopObserver, SessionBuilder, TopologySource};
//! use fc_store::MemoryStore;
//!
//! let mut session = SessionBuilder::new(FleetConfig::default(), MemoryStore::new())
//!     .topology(TopologySource::Static)
//!     .build()?;
//! let summary = session.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod session;
pub mod simulator;
pub mod topology;


pub use builder::{SessionBuilder, TopologySource};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SessionObserver};
pub use session::{AdvanceReport, CycleReport, RunSummary, Session, StopReason};
pub use simulator::{ChurnAction, ChurnKind, FleetSimulator, TickReport};
pub use topology::{generate, initial_charge, static_layout, travel_time, TopologyParams};
