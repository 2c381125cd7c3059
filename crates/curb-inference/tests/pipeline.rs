//! End-to-end pipeline tests against mocked vision, embedding, and store
//! endpoints.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use curb_inference::{
    CommentaryOutcome, CommentaryPipeline, EmbeddingClient, PipelineError, RetryPolicy,
    VisionClient,
};
use curb_models::EncodedFrame;
use curb_store::{ObservationStore, StoreConfig};

fn frame() -> EncodedFrame {
    EncodedFrame::new("data:image/jpeg;base64,/9j/4AAQ", 640, 480)
}

fn store_for(server: &MockServer) -> Arc<ObservationStore> {
    Arc::new(
        ObservationStore::new(StoreConfig {
            api_url: server.uri(),
            user: "root".to_string(),
            password: String::new(),
            database: "curbwatch_test".to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        })
        .unwrap(),
    )
}

fn pipeline_for(server: &MockServer) -> CommentaryPipeline {
    CommentaryPipeline::new(
        VisionClient::new("vision-key").with_base_url(server.uri()),
        EmbeddingClient::new("embed-key").with_base_url(server.uri()),
        store_for(server),
    )
    .with_retry(RetryPolicy::new(3, Duration::from_millis(5)))
}

async fn mount_vision_success(server: &MockServer, probability: u32) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": json!({
                "commentary": "a person sleeping in a doorway",
                "likeliness_of_homelessness": probability,
                "latency": 0.2
            }).to_string()}}],
            "usage": {"completion_time": 0.2}
        })))
        .mount(server)
        .await;
}

async fn mount_embedding_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}]
        })))
        .mount(server)
        .await;
}

async fn mount_store_success(server: &MockServer, expected_execs: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v2/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rowsAffected": 1})))
        .expect(expected_execs)
        .mount(server)
        .await;
}

#[tokio::test]
async fn success_appends_exactly_one_observation() {
    let server = MockServer::start().await;
    mount_vision_success(&server, 82).await;
    mount_embedding_success(&server).await;
    // One DDL round trip plus exactly one INSERT.
    mount_store_success(&server, 2).await;

    let outcome = pipeline_for(&server).generate(&frame()).await.unwrap();

    match outcome {
        CommentaryOutcome::Generated(observation) => {
            assert_eq!(observation.commentary, "a person sleeping in a doorway");
            assert_eq!(observation.homelessness_probability, Some(82));
            assert!(observation.embedding.is_some());
        }
        CommentaryOutcome::Exhausted { .. } => panic!("expected success"),
    }
}

#[tokio::test]
async fn terminal_failure_persists_nothing_and_stops_at_three_attempts() {
    let server = MockServer::start().await;

    // Vision fails every time; exactly three requests leave the pipeline.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;
    // No embedding call and no store call may happen.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/exec"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = pipeline_for(&server).generate(&frame()).await.unwrap();

    match outcome {
        CommentaryOutcome::Exhausted { attempts, message } => {
            assert_eq!(attempts, 3);
            assert_eq!(message, "Error generating commentary after 3 attempts.");
        }
        CommentaryOutcome::Generated(_) => panic!("expected exhaustion"),
    }
}

#[tokio::test]
async fn malformed_model_output_is_retried_like_a_network_failure() {
    let server = MockServer::start().await;

    // 200 OK but the content is not the constrained JSON object.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "no JSON here"}}]
        })))
        .expect(3)
        .mount(&server)
        .await;

    let outcome = pipeline_for(&server).generate(&frame()).await.unwrap();
    assert!(outcome.is_exhausted());
}

#[tokio::test]
async fn embedding_failure_still_appends_with_null_embedding() {
    let server = MockServer::start().await;
    mount_vision_success(&server, 40).await;
    // Embedding endpoint is down; exactly one attempt, no retry.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("nope"))
        .expect(1)
        .mount(&server)
        .await;
    // The append still happens: DDL + INSERT with a NULL embedding column.
    Mock::given(method("POST"))
        .and(path("/api/v2/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rowsAffected": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let outcome = pipeline_for(&server).generate(&frame()).await.unwrap();

    match outcome {
        CommentaryOutcome::Generated(observation) => {
            assert!(observation.embedding.is_none());
            assert_eq!(observation.homelessness_probability, Some(40));
        }
        CommentaryOutcome::Exhausted { .. } => panic!("expected success"),
    }
}

#[tokio::test]
async fn persistence_failure_propagates_but_carries_the_commentary() {
    let server = MockServer::start().await;
    mount_vision_success(&server, 60).await;
    mount_embedding_success(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/exec"))
        .respond_with(ResponseTemplate::new(500).set_body_string("write refused"))
        .mount(&server)
        .await;

    let err = pipeline_for(&server).generate(&frame()).await.unwrap_err();

    let PipelineError::Persistence { observation, .. } = err;
    assert_eq!(observation.commentary, "a person sleeping in a doorway");
}

#[tokio::test]
async fn probability_is_clamped_into_range() {
    let server = MockServer::start().await;
    mount_vision_success(&server, 400).await;
    mount_embedding_success(&server).await;
    mount_store_success(&server, 2).await;

    let outcome = pipeline_for(&server).generate(&frame()).await.unwrap();

    match outcome {
        CommentaryOutcome::Generated(observation) => {
            assert_eq!(observation.homelessness_probability, Some(100));
        }
        CommentaryOutcome::Exhausted { .. } => panic!("expected success"),
    }
}

#[tokio::test]
async fn store_insert_carries_the_observation_row() {
    let server = MockServer::start().await;
    mount_vision_success(&server, 55).await;
    mount_embedding_success(&server).await;

    // The INSERT must target the observations table with bound args.
    Mock::given(method("POST"))
        .and(path("/api/v2/exec"))
        .and(body_partial_json(json!({"database": "curbwatch_test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rowsAffected": 1})))
        .expect(2)
        .mount(&server)
        .await;

    pipeline_for(&server).generate(&frame()).await.unwrap();
}
