//! HTTP integration tests for the gateway, run against a mock AI service.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatlens_gateway::{Engine, Gateway, GatewayConfig, GatewayError};
use chatlens_protocol::audit::{AuditStatus, InMemoryAuditSink};
use chatlens_protocol::{Category, Emotion};

fn gateway(engine: Engine, base_url: &str, audit: Arc<InMemoryAuditSink>) -> Gateway {
    let config = GatewayConfig::new(base_url, "test-token")
        .with_replicate_version("model:abc123");
    Gateway::new(engine, &config, audit)
}

#[tokio::test]
async fn completion_roundtrip_records_success_audit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "hello back"}}],
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::OpenAi, &server.uri(), audit.clone());

    let text = gateway.generate_text("hello").await.unwrap();
    assert_eq!(text, "hello back");

    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AuditStatus::Success);
    assert_eq!(records[0].outcome.status_code, Some(200));
    assert!(records[0].entry.endpoint.ends_with("/openai/v1/chat/completions"));
    assert_eq!(records[0].entry.method, "POST");
}

#[tokio::test]
async fn non_2xx_surfaces_http_error_and_error_audit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "overloaded"})))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::OpenAi, &server.uri(), audit.clone());

    let result = gateway.generate_text("hello").await;
    match result {
        Err(GatewayError::Http { status, body, .. }) => {
            assert_eq!(status, 500);
            assert!(body.contains("overloaded"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }

    let records = audit.records();
    assert_eq!(records[0].status, AuditStatus::Error);
    assert_eq!(records[0].outcome.status_code, Some(500));
}

#[tokio::test]
async fn transport_failure_is_audited_without_status_code() {
    // Nothing listens on this port.
    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::OpenAi, "http://127.0.0.1:1", audit.clone());

    let result = gateway.generate_text("hello").await;
    assert!(matches!(result, Err(GatewayError::Transport { .. })));

    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AuditStatus::Error);
    assert_eq!(records[0].outcome.status_code, None);
}

#[tokio::test]
async fn claude_completion_sends_version_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/claude/v1/messages"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "bonjour"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::Claude, &server.uri(), audit);

    let text = gateway.generate_text("salut").await.unwrap();
    assert_eq!(text, "bonjour");
}

#[tokio::test]
async fn replicate_handle_triggers_secondary_fetch() {
    let server = MockServer::start().await;
    let poll_url = format!("{}/replicate/v1/predictions/p1", server.uri());

    Mock::given(method("POST"))
        .and(path("/replicate/v1/predictions"))
        .and(header("prefer", "wait"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "status": "starting",
            "urls": {"get": poll_url},
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/replicate/v1/predictions/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "status": "succeeded",
            "output": ["grouped ", "topics"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::Replicate, &server.uri(), audit.clone());

    let text = gateway.generate_text("summarize").await.unwrap();
    assert_eq!(text, "grouped topics");

    // Both the initial dispatch and the poll are audited.
    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == AuditStatus::Success));
}

#[tokio::test]
async fn grouped_analysis_coerces_unknown_category() {
    let server = MockServer::start().await;
    let generated = "```json\n{\"overview\": \"users complain about billing\", \
                     \"type\": \"complaint\", \"details\": \"recurring refund asks\"}\n```";
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": generated}}],
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::OpenAi, &server.uri(), audit);

    let analysis = gateway
        .grouped_messages_analysis("refund me, where is my refund")
        .await
        .unwrap();
    assert_eq!(analysis.category, Category::Other);
    assert_eq!(analysis.overview, "users complain about billing");
}

#[tokio::test]
async fn emotional_analysis_maps_label_to_vocabulary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content":
                "{\"label\": \"Surprised\", \"details\": \"the user did not expect the refund\"}"
            }}],
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::OpenAi, &server.uri(), audit);

    let analysis = gateway
        .emotional_analysis("user: wow, you refunded me already?")
        .await
        .unwrap();
    assert_eq!(analysis.emotion, Emotion::Surprised);
    assert_eq!(analysis.details, "the user did not expect the refund");
}

#[tokio::test]
async fn emotional_analysis_rejects_unknown_emotion() {
    let server = MockServer::start().await;
    // "confused" is outside the vocabulary; no coercion for emotions.
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content":
                "{\"label\": \"confused\", \"details\": \"hard to say\"}"
            }}],
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::OpenAi, &server.uri(), audit);

    let result = gateway.emotional_analysis("user: hm").await;
    assert!(matches!(
        result,
        Err(GatewayError::Format(message)) if message.contains("confused")
    ));
}

#[tokio::test]
async fn sentiment_analysis_rejects_partial_response() {
    let server = MockServer::start().await;
    // "details" is missing, so the call must fail instead of returning
    // partial data.
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"sentiment\": \"NEGATIVE\"}"}}],
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let gateway = gateway(Engine::OpenAi, &server.uri(), audit);

    let result = gateway.sentiment_analysis("user: this is broken").await;
    assert!(matches!(result, Err(GatewayError::Format(_))));
}
