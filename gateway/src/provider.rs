//! Provider adapters and the gateway facade.
//!
//! Each adapter implements the same `{request, parse}` contract: build a
//! provider-specific request from a canonical [`Operation`], then extract
//! a [`Normalized`] result from the raw response. The set of adapters is
//! closed over the [`Engine`] enum and selected once at construction.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chatlens_protocol::audit::AuditSink;
use chatlens_protocol::Embedding;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::error::{GatewayError, Result};

/// The supported generative-AI backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    OpenAi,
    Claude,
    Replicate,
}

impl Engine {
    /// Path segment used when routing through the AI service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::OpenAi => "openai",
            Engine::Claude => "claude",
            Engine::Replicate => "replicate",
        }
    }
}

/// Canonical operations accepted by every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// Generate text from a prompt.
    Completion { prompt: String },

    /// Embed text into a vector.
    Embedding { input: String },

    /// Run a hosted model prediction with arbitrary input.
    Prediction { input: serde_json::Value },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Operation::Completion { .. } => "completion",
            Operation::Embedding { .. } => "embedding",
            Operation::Prediction { .. } => "prediction",
        }
    }
}

/// Provider output normalized to one of three shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Generated text (completion).
    Text(String),

    /// Embedding vector.
    Vector(Embedding),

    /// Prediction output, provider-defined JSON.
    Output(serde_json::Value),
}

impl Normalized {
    /// Extract generated text.
    pub fn into_text(self) -> Result<String> {
        match self {
            Normalized::Text(text) => Ok(text),
            other => Err(GatewayError::Format(format!(
                "expected text result, got {other:?}"
            ))),
        }
    }

    /// Extract an embedding vector.
    pub fn into_vector(self) -> Result<Embedding> {
        match self {
            Normalized::Vector(vector) => Ok(vector),
            other => Err(GatewayError::Format(format!(
                "expected vector result, got {other:?}"
            ))),
        }
    }
}

/// A provider-specific request, ready for dispatch.
pub struct ProviderRequest {
    /// Path relative to the engine segment, e.g. `v1/chat/completions`.
    pub path: String,

    /// JSON body.
    pub body: serde_json::Value,

    /// Extra headers beyond auth and content type.
    pub headers: Vec<(String, String)>,
}

/// The per-backend adapter contract.
///
/// Adapters hold no shared mutable state; all call bookkeeping goes
/// through the audited [`Dispatcher`].
#[async_trait]
pub trait Provider: Send + Sync {
    fn engine(&self) -> Engine;

    /// Build the wire request for an operation.
    fn request(&self, operation: &Operation) -> Result<ProviderRequest>;

    /// Extract the normalized result from a successful response.
    fn parse(&self, operation: &Operation, response: serde_json::Value) -> Result<Normalized>;

    /// Resolve async handles before parsing. The default is a no-op; the
    /// Replicate adapter fetches the prediction result here when the
    /// first response only carries a handle.
    async fn resolve(
        &self,
        _dispatcher: &Dispatcher,
        response: serde_json::Value,
    ) -> Result<serde_json::Value> {
        Ok(response)
    }
}

fn unsupported(engine: Engine, operation: &Operation) -> GatewayError {
    GatewayError::Unsupported {
        engine: engine.as_str(),
        operation: operation.name(),
    }
}

/// OpenAI adapter: chat completions and embeddings.
pub struct OpenAiProvider {
    completion_model: String,
    embedding_model: String,
    embedding_dimensions: usize,
}

impl OpenAiProvider {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            completion_model: config.completion_model.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimensions: config.embedding_dimensions,
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn engine(&self) -> Engine {
        Engine::OpenAi
    }

    fn request(&self, operation: &Operation) -> Result<ProviderRequest> {
        match operation {
            Operation::Completion { prompt } => Ok(ProviderRequest {
                path: "v1/chat/completions".to_string(),
                body: serde_json::json!({
                    "model": self.completion_model,
                    "messages": [{"role": "user", "content": prompt}],
                }),
                headers: Vec::new(),
            }),
            Operation::Embedding { input } => Ok(ProviderRequest {
                path: "v1/embeddings".to_string(),
                body: serde_json::json!({
                    "model": self.embedding_model,
                    "input": input,
                    "encoding_format": "float",
                    "dimensions": self.embedding_dimensions,
                }),
                headers: Vec::new(),
            }),
            Operation::Prediction { .. } => Err(unsupported(self.engine(), operation)),
        }
    }

    fn parse(&self, operation: &Operation, response: serde_json::Value) -> Result<Normalized> {
        match operation {
            Operation::Completion { .. } => {
                let text = response["choices"][0]["message"]["content"]
                    .as_str()
                    .ok_or_else(|| {
                        GatewayError::Format("no choices[0].message.content in response".into())
                    })?;
                Ok(Normalized::Text(text.to_string()))
            }
            Operation::Embedding { .. } => {
                let values = response["data"][0]["embedding"].as_array().ok_or_else(|| {
                    GatewayError::Format("no data[0].embedding in response".into())
                })?;
                let vector = values
                    .iter()
                    .map(|v| {
                        v.as_f64().map(|f| f as f32).ok_or_else(|| {
                            GatewayError::Format("non-numeric embedding component".into())
                        })
                    })
                    .collect::<Result<Embedding>>()?;
                Ok(Normalized::Vector(vector))
            }
            Operation::Prediction { .. } => Err(unsupported(self.engine(), operation)),
        }
    }
}

/// Anthropic Claude adapter: messages API completions.
pub struct ClaudeProvider {
    model: String,
    max_tokens: u32,
}

impl ClaudeProvider {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            model: config.claude_model.clone(),
            max_tokens: config.claude_max_tokens,
        }
    }
}

#[async_trait]
impl Provider for ClaudeProvider {
    fn engine(&self) -> Engine {
        Engine::Claude
    }

    fn request(&self, operation: &Operation) -> Result<ProviderRequest> {
        match operation {
            Operation::Completion { prompt } => Ok(ProviderRequest {
                path: "v1/messages".to_string(),
                body: serde_json::json!({
                    "model": self.model,
                    "max_tokens": self.max_tokens,
                    "messages": [{"role": "user", "content": prompt}],
                }),
                headers: vec![("anthropic-version".to_string(), "2023-06-01".to_string())],
            }),
            _ => Err(unsupported(self.engine(), operation)),
        }
    }

    fn parse(&self, operation: &Operation, response: serde_json::Value) -> Result<Normalized> {
        match operation {
            Operation::Completion { .. } => {
                let text = response["content"][0]["text"].as_str().ok_or_else(|| {
                    GatewayError::Format("no content[0].text in response".into())
                })?;
                Ok(Normalized::Text(text.to_string()))
            }
            _ => Err(unsupported(self.engine(), operation)),
        }
    }
}

/// Replicate adapter: hosted model predictions.
///
/// Sends `Prefer: wait` so the service blocks until the prediction
/// finishes when it can; if the response still carries only a handle, one
/// secondary fetch of `urls.get` resolves the output.
pub struct ReplicateProvider {
    version: String,
}

impl ReplicateProvider {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            version: config.replicate_version.clone(),
        }
    }

    fn is_settled(response: &serde_json::Value) -> bool {
        if !response["output"].is_null() {
            return true;
        }
        matches!(
            response["status"].as_str(),
            Some("succeeded") | Some("failed") | Some("canceled")
        )
    }
}

#[async_trait]
impl Provider for ReplicateProvider {
    fn engine(&self) -> Engine {
        Engine::Replicate
    }

    fn request(&self, operation: &Operation) -> Result<ProviderRequest> {
        match operation {
            Operation::Prediction { input } => Ok(ProviderRequest {
                path: "v1/predictions".to_string(),
                body: serde_json::json!({
                    "version": self.version,
                    "input": input,
                }),
                headers: vec![("Prefer".to_string(), "wait".to_string())],
            }),
            _ => Err(unsupported(self.engine(), operation)),
        }
    }

    fn parse(&self, operation: &Operation, response: serde_json::Value) -> Result<Normalized> {
        match operation {
            Operation::Prediction { .. } => {
                if let Some(error) = response["error"].as_str() {
                    return Err(GatewayError::Format(format!("prediction failed: {error}")));
                }
                let output = response.get("output").cloned().unwrap_or(serde_json::Value::Null);
                if output.is_null() {
                    return Err(GatewayError::Format("no output in prediction response".into()));
                }
                Ok(Normalized::Output(output))
            }
            _ => Err(unsupported(self.engine(), operation)),
        }
    }

    async fn resolve(
        &self,
        dispatcher: &Dispatcher,
        response: serde_json::Value,
    ) -> Result<serde_json::Value> {
        if Self::is_settled(&response) {
            return Ok(response);
        }
        match response["urls"]["get"].as_str() {
            Some(url) => {
                debug!("Prediction returned a handle, fetching {url}");
                dispatcher.get(url).await
            }
            None => Ok(response),
        }
    }
}

/// The gateway facade: one engine, one adapter, one audited dispatcher.
pub struct Gateway {
    provider: Box<dyn Provider>,
    dispatcher: Dispatcher,
    base_url: String,
}

impl Gateway {
    /// Construct a gateway for the given engine.
    pub fn new(engine: Engine, config: &GatewayConfig, audit: Arc<dyn AuditSink>) -> Self {
        let provider: Box<dyn Provider> = match engine {
            Engine::OpenAi => Box::new(OpenAiProvider::new(config)),
            Engine::Claude => Box::new(ClaudeProvider::new(config)),
            Engine::Replicate => Box::new(ReplicateProvider::new(config)),
        };
        let dispatcher = Dispatcher::new(&config.token, engine.as_str(), audit);
        Self {
            provider,
            dispatcher,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn engine(&self) -> Engine {
        self.provider.engine()
    }

    /// Invoke a canonical operation against the configured backend.
    pub async fn invoke(&self, operation: Operation) -> Result<Normalized> {
        let request = self.provider.request(&operation)?;
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            self.provider.engine().as_str(),
            request.path
        );
        let response = self
            .dispatcher
            .post(&url, request.body, &request.headers)
            .await?;
        let response = self.provider.resolve(&self.dispatcher, response).await?;
        self.provider.parse(&operation, response)
    }

    /// Generate text from a prompt on whichever engine is configured.
    ///
    /// Completion engines answer directly; the prediction engine wraps
    /// the prompt as model input and flattens the output to text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        match self.provider.engine() {
            Engine::OpenAi | Engine::Claude => {
                self.invoke(Operation::Completion {
                    prompt: prompt.to_string(),
                })
                .await?
                .into_text()
            }
            Engine::Replicate => {
                let output = self
                    .invoke(Operation::Prediction {
                        input: serde_json::json!({"prompt": prompt}),
                    })
                    .await?;
                match output {
                    Normalized::Output(serde_json::Value::String(text)) => Ok(text),
                    Normalized::Output(serde_json::Value::Array(parts)) => Ok(parts
                        .iter()
                        .filter_map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .concat()),
                    other => Err(GatewayError::Format(format!(
                        "prediction output is not text: {other:?}"
                    ))),
                }
            }
        }
    }

    /// Embed text into a vector.
    pub async fn embed_text(&self, input: &str) -> Result<Embedding> {
        self.invoke(Operation::Embedding {
            input: input.to_string(),
        })
        .await?
        .into_vector()
    }
}
