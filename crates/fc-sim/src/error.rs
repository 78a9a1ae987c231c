use thiserror::Error;

use fc_core::{CoreError, NodeId};
use fc_dispatch::DispatchError;
use fc_graph::{GraphError, SyncError};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("topology has no charging station to start the agent at")]
    NoStation,

    #[error("start node {0} is not in the topology")]
    UnknownStart(NodeId),

    /// The tick's store transaction did not commit.  The store is unchanged;
    /// the fleet graph was not touched.
    #[error("tick failed: {0}")]
    TickFailed(#[source] SyncError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type SimResult<T> = Result<T, SimError>;
