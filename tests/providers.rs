use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

use study_mode::chat::{
    ChatMessage, ChatMode, ErrorCode, MessageRole,
    client::{CompletionModel, ModelRequest, Provider},
};

fn request() -> ModelRequest {
    ModelRequest {
        mode: ChatMode::Ask,
        lesson_title: "First Lesson".to_string(),
        system_prompt: "You are a tutor.".to_string(),
        history: vec![ChatMessage {
            role: MessageRole::Assistant,
            content: "Earlier answer".to_string(),
            timestamp: "2026-01-23T10:00:05Z".to_string(),
        }],
        prompt: "What is an agent?".to_string(),
        max_tokens: 1024,
        temperature: Some(0.7),
    }
}

#[tokio::test]
async fn openai_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 1024,
            "messages": [
                { "role": "system", "content": "You are a tutor." },
                { "role": "assistant", "content": "Earlier answer" },
                { "role": "user", "content": "What is an agent?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "An agent acts." } }],
            "usage": { "total_tokens": 42 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = Provider::OpenAI
        .client("sk-test", Some(&server.uri()), None)
        .unwrap()
        .completion_model("gpt-4o-mini");

    let response = model.completion(request()).await.unwrap();

    assert_eq!(response.content, "An agent acts.");
    assert_eq!(response.model, "gpt-4o-mini");
    assert_eq!(response.tokens_used, 42);
}

#[tokio::test]
async fn openai_missing_usage_counts_zero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ok" } }]
        })))
        .mount(&server)
        .await;

    let model = Provider::OpenAI
        .client("sk-test", Some(&server.uri()), None)
        .unwrap()
        .completion_model("gpt-4o-mini");

    assert_eq!(model.completion(request()).await.unwrap().tokens_used, 0);
}

#[tokio::test]
async fn openai_error_status_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let model = Provider::OpenAI
        .client("sk-test", Some(&server.uri()), None)
        .unwrap()
        .completion_model("gpt-4o-mini");

    let err = model.completion(request()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::AiUnavailable);
    assert_eq!(err.to_string(), "OpenAI API error: 500 upstream exploded");
}

#[tokio::test]
async fn openai_without_choices_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let model = Provider::OpenAI
        .client("sk-test", Some(&server.uri()), None)
        .unwrap()
        .completion_model("gpt-4o-mini");

    let err = model.completion(request()).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid OpenAI response format");
}

#[tokio::test]
async fn anthropic_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-haiku-20240307",
            "system": "You are a tutor.",
            "messages": [
                { "role": "assistant", "content": "Earlier answer" },
                { "role": "user", "content": "What is an agent?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "An agent acts." }],
            "usage": { "input_tokens": 30, "output_tokens": 12 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = Provider::Anthropic
        .client("ak-test", Some(&server.uri()), None)
        .unwrap()
        .completion_model("claude-3-haiku-20240307");

    let response = model.completion(request()).await.unwrap();

    assert_eq!(response.content, "An agent acts.");
    assert_eq!(response.tokens_used, 42);
}

#[tokio::test]
async fn anthropic_error_status_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let model = Provider::Anthropic
        .client("ak-test", Some(&server.uri()), None)
        .unwrap()
        .completion_model("claude-3-haiku-20240307");

    let err = model.completion(request()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::AiUnavailable);
    assert!(err.to_string().starts_with("Anthropic API error: 529"));
}

#[tokio::test]
async fn unreachable_provider_is_unavailable() {
    let model = Provider::OpenAI
        .client("sk-test", Some("http://127.0.0.1:9"), None)
        .unwrap()
        .completion_model("gpt-4o-mini");

    let err = model.completion(request()).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to connect to OpenAI");
}
