//! # AI Provider Gateway
//!
//! One contract over heterogeneous generative-AI backends.
//!
//! ## Features
//!
//! - **Uniform invocation**: `invoke(operation) -> Normalized` regardless
//!   of which backend serves the call
//! - **Closed engine set**: providers are tagged variants selected at
//!   construction, not runtime string dispatch
//! - **Audit logging**: every external call is recorded pending first,
//!   then completed with status code and raw body, even on transport
//!   failure
//! - **Analysis operations**: sentiment, emotion, labeling, titles,
//!   context-change and grouped-message analysis share the same provider
//!   per backend
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Gateway                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Operation ──► Provider {request, parse} ──► Normalized         │
//! │                      │                                          │
//! │                      ▼                                          │
//! │            Dispatcher ──► AuditSink                             │
//! │         (OpenAI / Claude / Replicate)                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod analysis;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod provider;

pub use analysis::{
    ContextChangeAnalysis, ContextShift, EmotionalAnalysis, GroupedAnalysis, LabelAnalysis,
    SentimentAnalysis, TitleAnalysis,
};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use provider::{Engine, Gateway, Normalized, Operation};
