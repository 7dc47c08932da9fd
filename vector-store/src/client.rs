//! The vector-store HTTP client.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use chatlens_protocol::audit::{AuditEntry, AuditOutcome, AuditSink, AuditStatus};
use chatlens_protocol::message::SenderRole;
use chatlens_protocol::point::Point;

use crate::error::{Result, StoreError};
use crate::types::{DistanceMetric, QueryTarget, Record, ScoredPoint};

/// Configuration for the vector-store client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store.
    pub base_url: String,

    /// Collection name prefix; collections are keyed `<prefix>_<agent>`.
    pub prefix: String,

    /// Vector dimension for newly created collections.
    pub dimension: usize,

    /// Distance metric for newly created collections.
    pub distance: DistanceMetric,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            prefix: "chatlens".to_string(),
            dimension: 3072,
            distance: DistanceMetric::Cosine,
        }
    }

    /// Set the collection name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the dimension for new collections.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}

/// Client for the remote vector store.
///
/// Every call passes through one audited `send` path; non-2xx responses
/// are returned as [`StoreError`] values, never panics, so batch callers
/// decide per-item handling.
pub struct VectorStoreClient {
    client: reqwest::Client,
    config: StoreConfig,
    audit: Arc<dyn AuditSink>,
}

impl VectorStoreClient {
    pub fn new(config: StoreConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            audit,
        }
    }

    /// The namespaced collection name for an agent.
    pub fn collection_name(&self, agent_id: &str) -> String {
        format!("{}_{agent_id}", self.config.prefix)
    }

    /// Dimension used for newly created collections.
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Collection name prefix this client namespaces under.
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// The agent id encoded in a collection name, if it carries this
    /// client's prefix.
    pub fn agent_of(&self, collection: &str) -> Option<String> {
        collection
            .strip_prefix(&self.config.prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(str::to_string)
    }

    /// Check whether an agent's collection exists.
    pub async fn collection_exists(&self, agent_id: &str) -> Result<bool> {
        let url = format!(
            "{}/collections/{}/exists",
            self.base(),
            self.collection_name(agent_id)
        );
        let result = self.send(Method::GET, &url, None).await?;
        result["exists"]
            .as_bool()
            .ok_or_else(|| StoreError::Format("no exists flag in response".into()))
    }

    /// Create an agent's collection with the configured dimension and
    /// distance metric.
    pub async fn create_collection(&self, agent_id: &str) -> Result<()> {
        let url = format!("{}/collections/{}", self.base(), self.collection_name(agent_id));
        let body = serde_json::json!({
            "vectors": {
                "size": self.config.dimension,
                "distance": self.config.distance,
            },
        });
        self.send(Method::PUT, &url, Some(body)).await?;
        info!("Created collection {}", self.collection_name(agent_id));
        Ok(())
    }

    /// Delete an agent's collection.
    pub async fn delete_collection(&self, agent_id: &str) -> Result<()> {
        let url = format!("{}/collections/{}", self.base(), self.collection_name(agent_id));
        self.send(Method::DELETE, &url, None).await?;
        info!("Deleted collection {}", self.collection_name(agent_id));
        Ok(())
    }

    /// List collection names under this client's prefix.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let url = format!("{}/collections", self.base());
        let result = self.send(Method::GET, &url, None).await?;
        let collections = result["collections"]
            .as_array()
            .ok_or_else(|| StoreError::Format("no collections array in response".into()))?;
        Ok(collections
            .iter()
            .filter_map(|c| c["name"].as_str())
            .filter(|name| name.starts_with(&self.config.prefix))
            .map(str::to_string)
            .collect())
    }

    /// Upsert points into an agent's collection.
    ///
    /// Re-upserting an id overwrites the stored point, so retries after a
    /// timeout cannot duplicate data. The write is only considered
    /// successful once the store acknowledges it.
    pub async fn upsert(&self, agent_id: &str, points: &[Point]) -> Result<()> {
        let url = format!(
            "{}/collections/{}/points",
            self.base(),
            self.collection_name(agent_id)
        );
        let body = serde_json::json!({"points": points});
        let result = self.send(Method::PUT, &url, Some(body)).await?;
        let status = result["status"].as_str();
        match status {
            Some("acknowledged") | Some("completed") | Some("ok") => {
                debug!("Upserted {} points into {}", points.len(), self.collection_name(agent_id));
                Ok(())
            }
            other => Err(StoreError::NotAcknowledged {
                status: other.map(str::to_string),
            }),
        }
    }

    /// Run a nearest-neighbor query against an agent's collection.
    pub async fn query(
        &self,
        agent_id: &str,
        target: QueryTarget,
        limit: usize,
        sender_filter: Option<SenderRole>,
        score_threshold: Option<f32>,
        with_payload: bool,
    ) -> Result<Vec<ScoredPoint>> {
        let url = format!(
            "{}/collections/{}/points/query",
            self.base(),
            self.collection_name(agent_id)
        );
        let mut body = serde_json::json!({
            "query": target.to_value(),
            "limit": limit,
            "with_payload": with_payload,
        });
        if let Some(threshold) = score_threshold {
            body["score_threshold"] = serde_json::json!(threshold);
        }
        if let Some(role) = sender_filter {
            body["filter"] = sender_role_filter(role);
        }
        let result = self.send(Method::POST, &url, Some(body)).await?;
        let points = result["points"]
            .as_array()
            .ok_or_else(|| StoreError::Format("no points array in query response".into()))?;
        points
            .iter()
            .map(|p| {
                serde_json::from_value::<ScoredPoint>(p.clone())
                    .map_err(|err| StoreError::Format(format!("bad scored point: {err}")))
            })
            .collect()
    }

    /// Scroll an agent's collection, payload included.
    pub async fn scroll(
        &self,
        agent_id: &str,
        limit: usize,
        sender_filter: Option<SenderRole>,
    ) -> Result<Vec<Record>> {
        let url = format!(
            "{}/collections/{}/points/scroll",
            self.base(),
            self.collection_name(agent_id)
        );
        let mut body = serde_json::json!({
            "limit": limit,
            "with_payload": true,
        });
        if let Some(role) = sender_filter {
            body["filter"] = sender_role_filter(role);
        }
        let result = self.send(Method::POST, &url, Some(body)).await?;
        let points = result["points"]
            .as_array()
            .ok_or_else(|| StoreError::Format("no points array in scroll response".into()))?;
        points
            .iter()
            .map(|p| {
                serde_json::from_value::<Record>(p.clone())
                    .map_err(|err| StoreError::Format(format!("bad record: {err}")))
            })
            .collect()
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// One audited dispatch path for every store call.
    ///
    /// Unwraps the store's `result` envelope on success.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let entry = AuditEntry {
            service: "vector-store".to_string(),
            endpoint: url.to_string(),
            method: method.to_string(),
            request_payload: body.clone().unwrap_or(serde_json::Value::Null),
        };
        let audit_id = self.audit.begin(entry).await;

        debug!("Dispatching {method} {url}");

        let mut request = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");
        if let Some(ref body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                error!("Transport failure calling {url}: {err}");
                self.audit
                    .complete(
                        audit_id,
                        AuditStatus::Error,
                        AuditOutcome::transport_failure(err.to_string()),
                    )
                    .await;
                return Err(StoreError::Transport {
                    endpoint: url.to_string(),
                    message: err.to_string(),
                });
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let payload: serde_json::Value =
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text.clone()));

        if !status.is_success() {
            error!("HTTP {status} from {url}: {text}");
            self.audit
                .complete(
                    audit_id,
                    AuditStatus::Error,
                    AuditOutcome::with_status(status.as_u16(), payload),
                )
                .await;
            return Err(StoreError::Http {
                status: status.as_u16(),
                endpoint: url.to_string(),
                body: text,
            });
        }

        self.audit
            .complete(
                audit_id,
                AuditStatus::Success,
                AuditOutcome::with_status(status.as_u16(), payload.clone()),
            )
            .await;

        // The store wraps results in a `result` envelope; unwrap when
        // present so callers see the logical payload.
        match payload.get("result") {
            Some(result) => Ok(result.clone()),
            None => Ok(payload),
        }
    }
}

fn sender_role_filter(role: SenderRole) -> serde_json::Value {
    serde_json::json!({
        "must": [{"key": "sender_role", "match": {"value": role.as_str()}}],
    })
}
