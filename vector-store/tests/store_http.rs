//! HTTP integration tests for the vector-store client.

use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatlens_protocol::audit::{AuditStatus, InMemoryAuditSink};
use chatlens_protocol::{Message, Point, SenderRole};
use chatlens_vector_store::{QueryTarget, StoreConfig, StoreError, VectorStoreClient};

fn client(base_url: &str, audit: Arc<InMemoryAuditSink>) -> VectorStoreClient {
    VectorStoreClient::new(StoreConfig::new(base_url).with_dimension(4), audit)
}

fn sample_point() -> Point {
    let message = Message::new("m1", "hello", SenderRole::User, "c1", "agent-1", Utc::now());
    Point::from_message(&message, vec![0.1, 0.2, 0.3, 0.4])
}

#[tokio::test]
async fn exists_check_unwraps_result_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/chatlens_agent-1/exists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"exists": true},
            "status": "ok",
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit.clone());

    assert!(client.collection_exists("agent-1").await.unwrap());

    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AuditStatus::Success);
    assert_eq!(records[0].entry.method, "GET");
}

#[tokio::test]
async fn create_collection_sends_dimension_and_distance() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/collections/chatlens_agent-1"))
        .and(body_partial_json(json!({
            "vectors": {"size": 4, "distance": "Cosine"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .expect(1)
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit);

    client.create_collection("agent-1").await.unwrap();
}

#[tokio::test]
async fn upsert_requires_acknowledgment() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/collections/chatlens_agent-1/points"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"operation_id": 7, "status": "acknowledged"},
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit);

    client.upsert("agent-1", &[sample_point()]).await.unwrap();
}

#[tokio::test]
async fn unacknowledged_upsert_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/collections/chatlens_agent-1/points"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"status": "nok"},
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit);

    let result = client.upsert("agent-1", &[sample_point()]).await;
    assert!(matches!(
        result,
        Err(StoreError::NotAcknowledged { status: Some(status) }) if status == "nok"
    ));
}

#[tokio::test]
async fn non_2xx_yields_error_value_and_error_audit() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/collections/chatlens_agent-1/points"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"status": {"error": "bad vector"}})),
        )
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit.clone());

    let result = client.upsert("agent-1", &[sample_point()]).await;
    match result {
        Err(StoreError::Http { status, body, .. }) => {
            assert_eq!(status, 422);
            assert!(body.contains("bad vector"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }

    let records = audit.records();
    assert_eq!(records[0].status, AuditStatus::Error);
    assert_eq!(records[0].outcome.status_code, Some(422));
}

#[tokio::test]
async fn query_sends_filter_and_threshold_and_parses_hits() {
    let server = MockServer::start().await;
    let neighbor = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/collections/chatlens_agent-1/points/query"))
        .and(body_partial_json(json!({
            "limit": 10,
            "score_threshold": 0.5,
            "with_payload": false,
            "filter": {"must": [{"key": "sender_role", "match": {"value": "user"}}]},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"points": [{"id": neighbor, "score": 0.91}]},
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit);

    let anchor = Uuid::new_v4();
    let hits = client
        .query(
            "agent-1",
            QueryTarget::Point(anchor),
            10,
            Some(SenderRole::User),
            Some(0.5),
            false,
        )
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, neighbor);
    assert!(hits[0].payload.is_none());
}

#[tokio::test]
async fn scroll_parses_payloads() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/collections/chatlens_agent-1/points/scroll"))
        .and(body_partial_json(json!({"with_payload": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"points": [{
                "id": id,
                "payload": {
                    "content": "hello",
                    "sender_role": "user",
                    "conversation_id": "c1",
                    "message_id": "m1",
                },
            }]},
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit);

    let records = client.scroll("agent-1", 100, None).await.unwrap();
    assert_eq!(records.len(), 1);
    let payload = records[0].payload.as_ref().unwrap();
    assert_eq!(payload.message_id, "m1");
    assert_eq!(payload.content, "hello");
}

#[tokio::test]
async fn list_collections_filters_by_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"collections": [
                {"name": "chatlens_agent-1"},
                {"name": "other_tenant"},
                {"name": "chatlens_agent-2"},
            ]},
        })))
        .mount(&server)
        .await;

    let audit = Arc::new(InMemoryAuditSink::new());
    let client = client(&server.uri(), audit);

    let names = client.list_collections().await.unwrap();
    assert_eq!(names, vec!["chatlens_agent-1", "chatlens_agent-2"]);
}
