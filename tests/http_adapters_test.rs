//! HTTP adapters against a mock server.
//!
//! Covers request shape, response parsing and the transient/permanent
//! error classification the retry layer relies on.

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use ragguard::adapters::embeddings::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use ragguard::adapters::generation::{GeminiConfig, GeminiGenerator};
use ragguard::adapters::{GuardedEmbedder, GuardedGenerator};
use ragguard::domain::ports::EmbeddingInput;
use ragguard::infrastructure::retry::RetryPolicy;
use ragguard::{DomainError, EmbeddingProvider, TextGenerator};

const GEMINI_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn gemini(server: &Server) -> GeminiGenerator {
    GeminiGenerator::new(GeminiConfig {
        api_key: Some("test-google-key".to_string()),
        base_url: server.url(),
        timeout_secs: 5,
        ..GeminiConfig::default()
    })
    .expect("Failed to create generator")
}

fn openai(server: &Server, dimension: usize) -> OpenAiEmbeddingProvider {
    OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig {
        api_key: Some("test-openai-key".to_string()),
        base_url: server.url(),
        dimension,
        timeout_secs: 5,
        ..OpenAiEmbeddingConfig::default()
    })
    .expect("Failed to create provider")
}

fn gemini_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_gemini_generate_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_header("x-goog-api-key", "test-google-key")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Is this VALID?" }] }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("VALID"))
        .create_async()
        .await;

    let text = gemini(&server).generate("Is this VALID?").await.unwrap();
    assert_eq!(text, "VALID");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_joins_multiple_parts() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", GEMINI_PATH)
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{ "content": { "parts": [{ "text": "Use " }, { "text": "prepared statements." }] } }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let text = gemini(&server).generate("q").await.unwrap();
    assert_eq!(text, "Use prepared statements.");
}

#[tokio::test]
async fn test_gemini_server_error_is_transient() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", GEMINI_PATH)
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let err = gemini(&server).generate("q").await.unwrap_err();
    assert!(matches!(err, DomainError::Generation { transient: true, .. }), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_gemini_bad_request_is_permanent() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", GEMINI_PATH)
        .with_status(400)
        .with_body(r#"{"error":{"message":"API key not valid"}}"#)
        .create_async()
        .await;

    let err = gemini(&server).generate("q").await.unwrap_err();
    assert!(matches!(err, DomainError::Generation { transient: false, .. }));
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn test_gemini_blocked_prompt_is_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", GEMINI_PATH)
        .with_status(200)
        .with_body(json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string())
        .create_async()
        .await;

    let err = gemini(&server).generate("q").await.unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_guarded_generator_retries_transient_failures() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let guarded = GuardedGenerator::new(
        Arc::new(gemini(&server)),
        Duration::from_secs(5),
        RetryPolicy::new(2, 1, 1),
    );
    let err = guarded.generate("q").await.unwrap_err();
    assert!(err.is_transient());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_guarded_generator_does_not_retry_permanent_failures() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .with_status(400)
        .expect(1)
        .create_async()
        .await;

    let guarded = GuardedGenerator::new(
        Arc::new(gemini(&server)),
        Duration::from_secs(5),
        RetryPolicy::new(3, 1, 1),
    );
    assert!(guarded.generate("q").await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_embed_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .match_header("authorization", "Bearer test-openai-key")
        .match_body(Matcher::PartialJson(json!({ "input": ["hello"], "dimensions": 3 })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "data": [{ "embedding": [0.1, 0.2, 0.3], "index": 0 }] }).to_string())
        .create_async()
        .await;

    let vector = openai(&server, 3).embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_batch_is_reordered_by_index() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(
            json!({
                "data": [
                    { "embedding": [0.0, 1.0], "index": 1 },
                    { "embedding": [1.0, 0.0], "index": 0 }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let inputs = vec![
        EmbeddingInput {
            id: "a".to_string(),
            text: "first".to_string(),
        },
        EmbeddingInput {
            id: "b".to_string(),
            text: "second".to_string(),
        },
    ];
    let outputs = openai(&server, 2).embed_batch(&inputs).await.unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].id, "a");
    assert_eq!(outputs[0].vector, vec![1.0, 0.0]);
    assert_eq!(outputs[1].id, "b");
    assert_eq!(outputs[1].vector, vec![0.0, 1.0]);
}

#[tokio::test]
async fn test_openai_dimension_mismatch_is_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(json!({ "data": [{ "embedding": [0.1, 0.2], "index": 0 }] }).to_string())
        .create_async()
        .await;

    let err = openai(&server, 3).embed("hello").await.unwrap_err();
    assert!(matches!(err, DomainError::Embedding { transient: false, .. }));
}

#[tokio::test]
async fn test_openai_rate_limit_is_transient() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .with_status(429)
        .with_body("slow down")
        .expect(2)
        .create_async()
        .await;

    let guarded = GuardedEmbedder::new(
        Arc::new(openai(&server, 3)),
        Duration::from_secs(5),
        RetryPolicy::new(1, 1, 1),
    );
    let err = guarded.embed("hello").await.unwrap_err();
    assert!(matches!(err, DomainError::Embedding { transient: true, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_unauthorized_is_permanent() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(401)
        .with_body("bad key")
        .create_async()
        .await;

    let err = openai(&server, 3).embed("hello").await.unwrap_err();
    assert!(matches!(err, DomainError::Embedding { transient: false, .. }));
}
