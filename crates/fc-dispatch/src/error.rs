use thiserror::Error;

use fc_core::NodeId;
use fc_graph::{GraphError, SyncError};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// No candidate destination can be reached from the agent's location.
    #[error("no candidate reachable from {from}")]
    Unreachable { from: NodeId },

    /// No parking site is below the low-charge threshold.
    #[error("no parking site needs charging")]
    NoCandidates,

    #[error("topology has no charging stations")]
    NoStations,

    #[error("{0} is not a charging station")]
    NotAStation(NodeId),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
