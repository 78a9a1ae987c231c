//! `fc-spatial`: travel network and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `TravelNetwork` (CSR), `TravelNetworkBuilder`               |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter`                   |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! Only stations and parking sites live in the travel network.  Vehicles are
//! attached to parking sites by the fleet graph and never appear here.

pub mod error;
pub mod network;
pub mod router;


pub use error::{SpatialError, SpatialResult};
pub use network::{TravelNetwork, TravelNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router};
