//! Audit-log port for external service calls.
//!
//! Every outbound call made by the AI gateway or the vector-store client
//! is recorded through this port: a pending record is created before
//! dispatch and completed with the final status, status code, and raw
//! response body afterwards, unconditionally. Transport failures are
//! therefore auditable even when no HTTP response exists.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one audit record.
pub type AuditId = Uuid;

/// Lifecycle status of an audited call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pending,
    Success,
    Error,
}

/// The request half of an audit record, captured before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Which service was called ("openai", "claude", "vector-store", ...).
    pub service: String,

    /// Full endpoint URL.
    pub endpoint: String,

    /// HTTP method.
    pub method: String,

    /// Request body as sent.
    pub request_payload: serde_json::Value,
}

/// The response half of an audit record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditOutcome {
    /// HTTP status code, when a response was received at all.
    pub status_code: Option<u16>,

    /// Raw response body, JSON when parseable, otherwise a string.
    pub response_payload: Option<serde_json::Value>,
}

impl AuditOutcome {
    pub fn with_status(status_code: u16, response_payload: serde_json::Value) -> Self {
        Self {
            status_code: Some(status_code),
            response_payload: Some(response_payload),
        }
    }

    /// Outcome for a call that never produced an HTTP response.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            response_payload: Some(serde_json::Value::String(message.into())),
        }
    }
}

/// A completed (or still pending) audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditId,
    pub entry: AuditEntry,
    pub status: AuditStatus,
    pub outcome: AuditOutcome,
    pub created_at: DateTime<Utc>,
}

/// Port for persisting audit records.
///
/// Injected into the gateway and the vector-store client; swappable with
/// [`InMemoryAuditSink`] in tests.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record a pending call before dispatch.
    async fn begin(&self, entry: AuditEntry) -> AuditId;

    /// Complete a previously recorded call.
    async fn complete(&self, id: AuditId, status: AuditStatus, outcome: AuditOutcome);
}

/// In-memory audit sink, used as the test double and as the default for
/// embedders that do not persist audit data.
#[derive(Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in insertion order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("audit lock poisoned").clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn begin(&self, entry: AuditEntry) -> AuditId {
        let id = Uuid::new_v4();
        let record = AuditRecord {
            id,
            entry,
            status: AuditStatus::Pending,
            outcome: AuditOutcome::default(),
            created_at: Utc::now(),
        };
        self.records.lock().expect("audit lock poisoned").push(record);
        id
    }

    async fn complete(&self, id: AuditId, status: AuditStatus, outcome: AuditOutcome) {
        let mut records = self.records.lock().expect("audit lock poisoned");
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.status = status;
            record.outcome = outcome;
        }
    }
}
