//! Audited HTTP dispatch shared by every provider adapter.

use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, error};

use chatlens_protocol::audit::{AuditEntry, AuditOutcome, AuditSink, AuditStatus};

use crate::error::{GatewayError, Result};

/// Sends provider requests and records each one through the audit port.
///
/// A pending audit record is created before dispatch and completed
/// unconditionally afterwards, so transport failures remain auditable.
pub struct Dispatcher {
    client: reqwest::Client,
    token: String,
    service: String,
    audit: Arc<dyn AuditSink>,
}

impl Dispatcher {
    pub fn new(token: impl Into<String>, service: impl Into<String>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            service: service.into(),
            audit,
        }
    }

    /// POST a JSON body, with optional provider-specific headers.
    pub async fn post(
        &self,
        url: &str,
        body: serde_json::Value,
        headers: &[(String, String)],
    ) -> Result<serde_json::Value> {
        self.send(Method::POST, url, Some(body), headers).await
    }

    /// GET a JSON resource (used for prediction handle polling).
    pub async fn get(&self, url: &str) -> Result<serde_json::Value> {
        self.send(Method::GET, url, None, &[]).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
        headers: &[(String, String)],
    ) -> Result<serde_json::Value> {
        let entry = AuditEntry {
            service: self.service.clone(),
            endpoint: url.to_string(),
            method: method.to_string(),
            request_payload: body.clone().unwrap_or(serde_json::Value::Null),
        };
        let audit_id = self.audit.begin(entry).await;

        debug!("Dispatching {method} {url}");

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.header(name, value);
        }
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
                return Err(GatewayError::Transport {
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
            return Err(GatewayError::Http {
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

        Ok(payload)
    }
}
