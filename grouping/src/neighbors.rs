//! Neighbor lookups backed by the vector store's recommend-by-point
//! query.

use async_trait::async_trait;
use uuid::Uuid;

use chatlens_clustering::NeighborSource;
use chatlens_protocol::SenderRole;
use chatlens_vector_store::{QueryTarget, VectorStoreClient};

/// Adapts one agent's collection to the clustering engine.
///
/// Payloads are skipped on neighbor queries; clustering only needs ids
/// and scores, and members are rehydrated from the message records
/// afterwards.
pub struct StoreNeighborSource<'a> {
    store: &'a VectorStoreClient,
    agent_id: &'a str,
    role: Option<SenderRole>,
}

impl<'a> StoreNeighborSource<'a> {
    pub fn new(
        store: &'a VectorStoreClient,
        agent_id: &'a str,
        role: Option<SenderRole>,
    ) -> Self {
        Self {
            store,
            agent_id,
            role,
        }
    }
}

#[async_trait]
impl NeighborSource for StoreNeighborSource<'_> {
    async fn neighbors(
        &self,
        anchor: Uuid,
        top_k: usize,
        score_threshold: f32,
    ) -> anyhow::Result<Vec<(Uuid, f32)>> {
        let hits = self
            .store
            .query(
                self.agent_id,
                QueryTarget::Point(anchor),
                top_k,
                self.role,
                Some(score_threshold),
                false,
            )
            .await?;
        Ok(hits.into_iter().map(|hit| (hit.id, hit.score)).collect())
    }
}
