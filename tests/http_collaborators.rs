//! Sessions and extraction driven through the HTTP client against a mock
//! OpenAI-compatible server

use chat_context::extraction::{validate, InfoExtractor};
use chat_context::llm::{LlmSummarizer, OpenAiCompatibleClient};
use chat_context::{ChatSession, ContextError, ConversationConfig, LlmConfig, Role};
use mockito::Matcher;
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;

fn client_for(server: &mockito::Server) -> Arc<OpenAiCompatibleClient> {
    let config = LlmConfig {
        endpoint: format!("{}/openai/v1/chat/completions", server.url()),
        api_key: Some(SecretString::new("gsk-test".to_string())),
        max_attempts: 1,
        timeout_ms: 2000,
        ..LlmConfig::default()
    };
    Arc::new(OpenAiCompatibleClient::new(config).unwrap())
}

fn completion_body(content: &str) -> String {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
}

fn tool_call_body(arguments: serde_json::Value) -> String {
    json!({"choices": [{"message": {
        "role": "assistant",
        "content": null,
        "tool_calls": [{
            "id": "call_0",
            "type": "function",
            "function": {"name": "extract_info", "arguments": arguments.to_string()}
        }]
    }}]})
    .to_string()
}

#[tokio::test]
async fn test_session_summarizes_over_http() {
    let mut server = mockito::Server::new_async().await;

    let summary = server
        .mock("POST", "/openai/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "system", "content": "Summarize in 2 sentences."}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("The user is building a Python app. They asked about storage."))
        .expect(1)
        .create_async()
        .await;

    let chat_mock = server
        .mock("POST", "/openai/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "system", "content": "You are helpful."}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("Sure, happy to help."))
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server);
    let summarizer = Arc::new(LlmSummarizer::new(client.clone(), "llama-3.3-70b-versatile"));
    let mut chat = ChatSession::new(
        ConversationConfig::with_limits(6, 2000, 500, 3),
        client,
        summarizer,
    )
    .unwrap();

    for text in [
        "Hi! I'm working on a Python project.",
        "I need help with data structures.",
        "What's the best way to store user data?",
    ] {
        assert_eq!(chat.process_turn(text).await.unwrap(), "Sure, happy to help.");
    }

    let first = chat.buffer().get(0).unwrap();
    assert_eq!(first.role(), Role::SummaryMarker);
    assert_eq!(
        first.content(),
        "[SUMMARY: The user is building a Python app. They asked about storage.]"
    );
    assert_eq!(chat.buffer().len(), 4);

    summary.assert_async().await;
    chat_mock.assert_async().await;
}

#[tokio::test]
async fn test_summary_failure_does_not_abort_turn() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/openai/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "system", "content": "Summarize in 2 sentences."}]
        })))
        .with_status(500)
        .create_async()
        .await;

    server
        .mock("POST", "/openai/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "system", "content": "You are helpful."}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("ok"))
        .create_async()
        .await;

    let client = client_for(&server);
    let summarizer = Arc::new(LlmSummarizer::new(client.clone(), "m"));
    let mut chat = ChatSession::new(ConversationConfig::with_limits(10, 5000, 1000, 2), client, summarizer)
        .unwrap();

    for text in ["one", "two", "three", "four"] {
        chat.process_turn(text).await.unwrap();
    }

    assert_eq!(chat.buffer().len(), 8);
    assert!(chat.buffer().iter().all(|m| !m.is_summary()));
}

#[tokio::test]
async fn test_completion_failure_aborts_turn() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/openai/v1/chat/completions")
        .with_status(401)
        .with_body("invalid api key")
        .create_async()
        .await;

    let client = client_for(&server);
    let summarizer = Arc::new(LlmSummarizer::new(client.clone(), "m"));
    let mut chat = ChatSession::new(ConversationConfig::default(), client, summarizer).unwrap();

    let result = chat.process_turn("Hello").await;

    assert!(matches!(result, Err(ContextError::Llm(_))));
    assert_eq!(chat.buffer().len(), 1);
}

#[tokio::test]
async fn test_extraction_of_partial_contact() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/openai/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "tool_choice": {"type": "function", "function": {"name": "extract_info"}},
            "messages": [
                {"role": "system", "content": "Extract personal info. Use null for missing."},
                {"role": "user", "content": "Extract from: Hey, I'm Mike from Seattle. You can reach me at mike@tech.io"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(tool_call_body(json!({
            "name": "Mike",
            "email": "mike@tech.io",
            "phone": null,
            "location": "Seattle",
            "age": null
        })))
        .create_async()
        .await;

    let extractor = InfoExtractor::new(client_for(&server), "llama-3.3-70b-versatile");
    let record = extractor
        .extract("Hey, I'm Mike from Seattle. You can reach me at mike@tech.io")
        .await;

    assert!(record.name.is_some());
    assert!(record.email.is_some());
    assert!(record.phone.is_none());
    assert!(record.age.is_none());

    let report = validate(&record);
    assert!(report.is_valid);
    assert_eq!(report.extracted_count, 3);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn test_extraction_failure_is_all_null() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/openai/v1/chat/completions")
        .with_status(503)
        .create_async()
        .await;

    let extractor = InfoExtractor::new(client_for(&server), "m");
    let record = extractor.extract("I need help with my coding project.").await;

    assert!(record.is_empty());
    let report = extractor.validate(&record);
    assert!(report.is_valid);
    assert_eq!(report.extracted_count, 0);
}
