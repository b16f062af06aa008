use httpmock::prelude::*;
use recon_triage::core::LanguageModel;
use recon_triage::domain::model::ModelSettings;
use recon_triage::{GroqClient, ReconError};

fn client_for(server: &MockServer) -> GroqClient {
    GroqClient::new(ModelSettings {
        endpoint: server.url("/openai/v1/chat/completions"),
        api_key: "gsk_test".to_string(),
        model: "llama-3.1-8b-instant".to_string(),
        temperature: 0.1,
        max_tokens: 500,
        ..ModelSettings::default()
    })
}

#[tokio::test]
async fn test_complete_sends_chat_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .header("authorization", "Bearer gsk_test")
            .json_body(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 0.1,
                "max_tokens": 500
            }));
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  {\"is_resolved\": true}\n"}}]
        }));
    });

    let reply = client_for(&server).complete("hello").await.unwrap();

    mock.assert();
    assert_eq!(reply, "{\"is_resolved\": true}");
}

#[tokio::test]
async fn test_complete_reports_http_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/openai/v1/chat/completions");
        then.status(401).body("invalid api key");
    });

    let err = client_for(&server).complete("hello").await.unwrap_err();
    match err {
        ReconError::LlmError { message } => {
            assert!(message.contains("401"));
            assert!(message.contains("invalid api key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_complete_rejects_empty_choices() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/openai/v1/chat/completions");
        then.status(200).json_body(serde_json::json!({"choices": []}));
    });

    let err = client_for(&server).complete("hello").await.unwrap_err();
    assert!(matches!(err, ReconError::LlmError { .. }));
}

#[tokio::test]
async fn test_complete_rejects_undecodable_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/openai/v1/chat/completions");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html>gateway says hi</html>");
    });

    let err = client_for(&server).complete("hello").await.unwrap_err();
    match err {
        ReconError::LlmError { message } => assert!(message.contains("Undecodable")),
        other => panic!("unexpected error: {other:?}"),
    }
}
