//! Fleet-graph error type.

use thiserror::Error;

use fc_core::{NodeId, NodeKind};
use fc_spatial::SpatialError;

use crate::sync::SyncError;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0} not found in fleet graph")]
    NodeNotFound(NodeId),

    #[error("node {0} appears twice in snapshot")]
    DuplicateNode(NodeId),

    /// The node's kind has no store writer.
    #[error("no writer for {kind} node {id}")]
    UnknownNodeKind { id: NodeId, kind: NodeKind },

    #[error("attribute `{attribute}` does not apply to {kind} node {id}")]
    AttributeMismatch { id: NodeId, kind: NodeKind, attribute: &'static str },

    #[error("vehicle {vehicle} references {site}, which is not a parking site")]
    DanglingVehicle { vehicle: NodeId, site: NodeId },

    #[error("{0} is a vehicle and cannot be a route endpoint")]
    NotRoutable(NodeId),

    #[error("routing edge {a} - {b} touches a vehicle or unknown node")]
    NonRoutableEdge { a: NodeId, b: NodeId },

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type GraphResult<T> = Result<T, GraphError>;
