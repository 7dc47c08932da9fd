//! The grouping orchestrator.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::anyhow;
use futures::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use chatlens_clustering::{ClusteringConfig, ClusteringEngine};
use chatlens_embeddings::EmbeddingPipeline;
use chatlens_gateway::Gateway;
use chatlens_protocol::cluster::{Cluster, ClusterMember, GroupedMessageSet};
use chatlens_protocol::point::PointPayload;
use chatlens_protocol::{Message, SenderRole};
use chatlens_vector_store::{QueryTarget, VectorStoreClient};

use crate::error::{GroupingError, Result};
use crate::neighbors::StoreNeighborSource;
use crate::ports::{GroupedStore, MessageStore};

/// Outcome of one agent's batch within an embedding pass.
#[derive(Debug)]
pub struct AgentBatch {
    /// Agent the batch belongs to.
    pub agent_id: String,

    /// Messages embedded, upserted, and flagged.
    pub embedded: usize,

    /// Messages skipped by per-message embedding failures.
    pub failed: usize,

    /// Set when the whole batch was abandoned before any flag flipped.
    pub error: Option<String>,
}

/// Report for one embedding pass across all agents with pending messages.
#[derive(Debug, Default)]
pub struct EmbedReport {
    /// Per-agent outcomes, in agent-id order.
    pub batches: Vec<AgentBatch>,
}

impl EmbedReport {
    pub fn total_embedded(&self) -> usize {
        self.batches.iter().map(|b| b.embedded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.batches.iter().map(|b| b.failed).sum()
    }
}

/// Outcome of a regroup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegroupOutcome {
    /// A new grouped-message set replaced the stored one.
    Regrouped { clusters: usize },

    /// The stored set is newer than every qualifying message; kept as is.
    Unchanged,
}

/// One similarity-search hit, rehydrated from the point payload.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Platform-assigned message id.
    pub message_id: String,

    /// Conversation the message belongs to.
    pub conversation_id: String,

    /// Original message text.
    pub content: String,

    /// Author of the message.
    pub sender_role: SenderRole,

    /// Similarity score under the collection's metric.
    pub score: f32,
}

impl SearchHit {
    fn from_payload(payload: PointPayload, score: f32) -> Self {
        Self {
            message_id: payload.message_id,
            conversation_id: payload.conversation_id,
            content: payload.content,
            sender_role: payload.sender_role,
            score,
        }
    }
}

/// Orchestrates the per-agent embed, cluster, enrich, and search
/// lifecycle.
pub struct Grouper {
    gateway: Arc<Gateway>,
    store: Arc<VectorStoreClient>,
    pipeline: EmbeddingPipeline,
    messages: Arc<dyn MessageStore>,
    grouped: Arc<dyn GroupedStore>,
    clustering: ClusteringConfig,
    fanout: usize,
}

impl Grouper {
    pub fn new(
        gateway: Arc<Gateway>,
        store: Arc<VectorStoreClient>,
        messages: Arc<dyn MessageStore>,
        grouped: Arc<dyn GroupedStore>,
    ) -> Self {
        Self {
            pipeline: EmbeddingPipeline::new(gateway.clone()),
            gateway,
            store,
            messages,
            grouped,
            clustering: ClusteringConfig::default(),
            fanout: 4,
        }
    }

    /// Override the clustering tuning knobs.
    pub fn with_clustering(mut self, clustering: ClusteringConfig) -> Self {
        self.clustering = clustering;
        self
    }

    /// Bound on concurrent agents during [`Grouper::regroup_all`].
    pub fn with_fanout(mut self, fanout: usize) -> Self {
        self.fanout = fanout.max(1);
        self
    }

    /// Embed every pending message, agent by agent.
    ///
    /// Each agent's batch is independent: a failure abandons that batch
    /// and moves on, leaving its messages pending for the next pass. A
    /// message's embedded flag flips only after the store acknowledges
    /// the upsert that contains its point.
    pub async fn embed_pending(&self) -> Result<EmbedReport> {
        let pending = self.messages.pending().await?;
        let mut by_agent: BTreeMap<String, Vec<Message>> = BTreeMap::new();
        for message in pending {
            by_agent.entry(message.agent_id.clone()).or_default().push(message);
        }

        let mut report = EmbedReport::default();
        for (agent_id, batch) in by_agent {
            report.batches.push(self.embed_agent_batch(&agent_id, &batch).await);
        }
        info!(
            "Embedding pass: {} embedded, {} failed across {} agent(s)",
            report.total_embedded(),
            report.total_failed(),
            report.batches.len()
        );
        Ok(report)
    }

    async fn embed_agent_batch(&self, agent_id: &str, batch: &[Message]) -> AgentBatch {
        let abandoned = |error: String| AgentBatch {
            agent_id: agent_id.to_string(),
            embedded: 0,
            failed: batch.len(),
            error: Some(error),
        };

        match self.ensure_collection(agent_id).await {
            Ok(()) => {}
            Err(err) => {
                warn!("Abandoning batch for {agent_id}: {err}");
                return abandoned(err.to_string());
            }
        }

        let embedded = self.pipeline.embed(batch).await;
        if !embedded.points.is_empty() {
            if let Err(err) = self.store.upsert(agent_id, &embedded.points).await {
                warn!("Abandoning batch for {agent_id}: {err}");
                return abandoned(err.to_string());
            }
        }

        let succeeded: Vec<String> = embedded
            .succeeded_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        if let Err(err) = self.messages.mark_embedded(&succeeded).await {
            warn!("Abandoning batch for {agent_id}: {err}");
            return abandoned(err.to_string());
        }

        AgentBatch {
            agent_id: agent_id.to_string(),
            embedded: succeeded.len(),
            failed: embedded.failures.len(),
            error: None,
        }
    }

    async fn ensure_collection(&self, agent_id: &str) -> chatlens_vector_store::Result<()> {
        if !self.store.collection_exists(agent_id).await? {
            self.store.create_collection(agent_id).await?;
        }
        Ok(())
    }

    /// Recompute an agent's grouped-message set.
    ///
    /// Skips the pass when the stored set already covers every
    /// qualifying message; the stored set is otherwise replaced
    /// wholesale.
    pub async fn regroup(
        &self,
        agent_id: &str,
        role: Option<SenderRole>,
    ) -> Result<RegroupOutcome> {
        if !self.store.collection_exists(agent_id).await? {
            return Err(GroupingError::MissingCollection {
                agent_id: agent_id.to_string(),
            });
        }

        let candidates: Vec<Message> = self
            .messages
            .by_agent(agent_id, role)
            .await?
            .into_iter()
            .filter(|m| m.embedded)
            .collect();
        if candidates.len() < 2 {
            return Err(GroupingError::TooFewMessages {
                agent_id: agent_id.to_string(),
                count: candidates.len(),
            });
        }

        // The gate keys on platform creation time, not embedding time: a
        // message created before the stored set but embedded after it does
        // not trigger a resync until a newer message arrives.
        if let Some(existing) = self.grouped.load(agent_id).await? {
            let newest = candidates.iter().map(|m| m.created_at).max();
            if newest.is_some_and(|newest| newest <= existing.created_at) {
                info!("Grouped set for {agent_id} is current, skipping");
                return Ok(RegroupOutcome::Unchanged);
            }
        }

        let anchors: Vec<Uuid> = candidates.iter().map(|m| m.embedding_id).collect();
        let source = StoreNeighborSource::new(&self.store, agent_id, role);
        let engine = ClusteringEngine::new(source, self.clustering);
        let components = engine.cluster(&anchors).await;

        let index: HashMap<Uuid, &Message> =
            candidates.iter().map(|m| (m.embedding_id, m)).collect();
        let mut clusters = Vec::with_capacity(components.len());
        for component in components {
            clusters.push(self.build_cluster(component, &index).await?);
        }

        let count = clusters.len();
        let set = GroupedMessageSet::new(agent_id, clusters)?;
        self.grouped.replace(set).await?;
        info!("Regrouped {agent_id}: {count} cluster(s)");
        Ok(RegroupOutcome::Regrouped { clusters: count })
    }

    async fn build_cluster(
        &self,
        component: chatlens_clustering::Component,
        index: &HashMap<Uuid, &Message>,
    ) -> Result<Cluster> {
        let mut cluster = Cluster::new(component.members, component.score)?;
        cluster.members = cluster
            .point_ids
            .iter()
            .filter_map(|id| index.get(id))
            .map(|message| ClusterMember {
                message_id: message.id.clone(),
                conversation_id: message.conversation_id.clone(),
                content: message.content.clone(),
            })
            .collect();
        // Points without a matching record (stale or out-of-role) stay in
        // point_ids but cannot be rehydrated.
        if cluster.members.len() < cluster.point_ids.len() {
            warn!(
                "{} of {} cluster point(s) have no matching message record",
                cluster.point_ids.len() - cluster.members.len(),
                cluster.point_ids.len()
            );
        }

        // Enrichment failures leave the cluster unannotated rather than
        // discarding the grouping work.
        match self
            .gateway
            .grouped_messages_analysis(&cluster.joined_contents())
            .await
        {
            Ok(analysis) => {
                cluster.overview = Some(analysis.overview);
                cluster.category = Some(analysis.category);
            }
            Err(err) => {
                warn!("Cluster enrichment failed: {err}");
            }
        }
        Ok(cluster)
    }

    /// Regroup every agent with a collection, with bounded concurrency.
    ///
    /// Per-agent failures are reported, never propagated: one agent's
    /// error does not stop the rest.
    pub async fn regroup_all(
        &self,
        role: Option<SenderRole>,
    ) -> Result<Vec<(String, Result<RegroupOutcome>)>> {
        let agents: Vec<String> = self
            .store
            .list_collections()
            .await?
            .iter()
            .filter_map(|name| self.store.agent_of(name))
            .collect();

        let mut outcomes: Vec<(String, Result<RegroupOutcome>)> =
            futures::stream::iter(agents)
                .map(|agent_id| async move {
                    let outcome = self.regroup(&agent_id, role).await;
                    if let Err(ref err) = outcome {
                        warn!("Regroup failed for {agent_id}: {err}");
                    }
                    (agent_id, outcome)
                })
                .buffer_unordered(self.fanout)
                .collect()
                .await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(outcomes)
    }

    /// Find an agent's stored messages most similar to a query string.
    pub async fn search(
        &self,
        agent_id: &str,
        query: &str,
        limit: usize,
        role: Option<SenderRole>,
    ) -> Result<Vec<SearchHit>> {
        let vector = self.pipeline.embed_query(query).await?;
        let hits = self
            .store
            .query(agent_id, QueryTarget::Vector(vector), limit, role, None, true)
            .await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                hit.payload
                    .map(|payload| SearchHit::from_payload(payload, hit.score))
            })
            .collect())
    }

    /// An agent's grouped-message set, computed on first access.
    pub async fn grouped_messages(
        &self,
        agent_id: &str,
        role: Option<SenderRole>,
    ) -> Result<GroupedMessageSet> {
        if let Some(set) = self.grouped.load(agent_id).await? {
            return Ok(set);
        }
        self.regroup(agent_id, role).await?;
        self.grouped
            .load(agent_id)
            .await?
            .ok_or_else(|| GroupingError::Backend(anyhow!("regroup stored no set for {agent_id}")))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_report_totals() {
        let report = EmbedReport {
            batches: vec![
                AgentBatch {
                    agent_id: "a".into(),
                    embedded: 3,
                    failed: 1,
                    error: None,
                },
                AgentBatch {
                    agent_id: "b".into(),
                    embedded: 0,
                    failed: 2,
                    error: Some("store unreachable".into()),
                },
            ],
        };
        assert_eq!(report.total_embedded(), 3);
        assert_eq!(report.total_failed(), 3);
    }
}
