use thiserror::Error;

use chatlens_gateway::GatewayError;
use chatlens_protocol::cluster::InvalidClusterSet;
use chatlens_vector_store::StoreError;

pub type Result<T> = std::result::Result<T, GroupingError>;

/// Failures surfaced by the grouping orchestrator.
#[derive(Error, Debug)]
pub enum GroupingError {
    /// Regrouping requires the agent's collection to exist already.
    #[error("agent {agent_id} has no collection; embed its messages first")]
    MissingCollection { agent_id: String },

    /// Clustering needs at least two qualifying messages.
    #[error("agent {agent_id} has {count} qualifying message(s), minimum is 2")]
    TooFewMessages { agent_id: String, count: usize },

    /// A vector-store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An AI gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The clustering pass produced an invalid set.
    #[error(transparent)]
    InvalidClusters(#[from] InvalidClusterSet),

    /// The backing message or grouped-set store failed.
    #[error("persistence backend error: {0}")]
    Backend(#[from] anyhow::Error),
}
