//! Spatial-subsystem error type.

use thiserror::Error;

use fc_core::NodeId;

/// Errors produced by `fc-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in travel network")]
    NodeNotFound(NodeId),

    #[error("node {0} added to travel network twice")]
    DuplicateNode(NodeId),

    #[error("edge {from} -> {to} has invalid travel time {travel_time}")]
    InvalidTravelTime { from: NodeId, to: NodeId, travel_time: f64 },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
