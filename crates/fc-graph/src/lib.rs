//! `fc-graph`: the fleet topology and its backing-store contract.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                      |
//! |-----------|---------------------------------------------------------------|
//! | [`node`]  | `Station`, `ParkingSite`, `Vehicle`, `Node`, `AttrChange`     |
//! | [`graph`] | `FleetGraph`, `SiteSummary`, `RouteEdge`, `ReconcileReport`   |
//! | [`sync`]  | `SyncAdapter`, `FleetStore`, snapshot/delta records, `SyncError` |
//! | [`error`] | `GraphError`, `GraphResult<T>`                                |
//!
//! The graph is exclusively owned by one simulation session and is only ever
//! touched from that session's thread.

pub mod error;
pub mod graph;
pub mod node;
pub mod sync;

#[cfg(test)]
mod tests;

pub use error::{GraphError, GraphResult};
pub use graph::{FleetGraph, ReconcileReport, RouteEdge, SiteSummary, FULL_CHARGE};
pub use node::{AttrChange, Node, ParkingSite, Station, Vehicle};
pub use sync::{
    transact, Delta, EdgeRecord, FleetStore, NodeRecord, Snapshot, SyncAdapter, SyncError,
    SyncResult, WriteTarget,
};
