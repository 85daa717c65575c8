//! OpenAI-compatible chat completions client with retry

use super::backend::{CompletionBackend, FunctionCallBackend, LlmError};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ToolDefinition};
use crate::config::LlmConfig;
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// HTTP client for any `/chat/completions` endpoint (Groq, OpenAI, vLLM, ...)
pub struct OpenAiCompatibleClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatibleClient {
    /// Create a new client
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::InitializationError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// POST the request, retrying with exponential backoff
    async fn send(
        &self,
        operation: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let start = Instant::now();
        let mut last_error = None;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, operation);
                tokio::time::sleep(Duration::from_millis(100 * (1 << attempt))).await;
            }

            let mut req = self.client.post(&self.config.endpoint).json(request);

            if let Some(ref api_key) = self.config.api_key {
                req = req.bearer_auth(api_key.expose_secret());
            }

            match req.send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        let error = LlmError::ApiError(format!("HTTP {}: {}", status, body));
                        if !is_retryable(status) {
                            METRICS.record_llm_request(operation, false, start.elapsed().as_secs_f64());
                            warn!("{} rejected with {}", operation, status);
                            return Err(error);
                        }
                        last_error = Some(error);
                        continue;
                    }

                    match response.json::<ChatCompletionResponse>().await {
                        Ok(resp) => {
                            METRICS.record_llm_request(operation, true, start.elapsed().as_secs_f64());
                            return Ok(resp);
                        }
                        Err(e) => {
                            last_error = Some(LlmError::InvalidResponse(format!(
                                "Failed to parse response: {}",
                                e
                            )));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::NetworkError(e.to_string()));
                }
            }
        }

        METRICS.record_llm_request(operation, false, start.elapsed().as_secs_f64());
        warn!("{} failed after {} attempts", operation, self.config.max_attempts);
        Err(last_error.unwrap_or(LlmError::Unknown))
    }
}

// Client errors other than rate limiting will not succeed on resend.
fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleClient {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String, LlmError> {
        debug!("Requesting completion: {} messages, model={}", messages.len(), model);

        let request = ChatCompletionRequest::new(model, messages.to_vec());
        let response = self.send("complete", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No content in response".to_string()))
    }
}

#[async_trait]
impl FunctionCallBackend for OpenAiCompatibleClient {
    async fn call_function(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tool: &ToolDefinition,
    ) -> Result<serde_json::Value, LlmError> {
        debug!("Requesting function call {}: model={}", tool.name(), model);

        let request =
            ChatCompletionRequest::new(model, messages.to_vec()).with_forced_tool(tool.clone());
        let response = self.send("function_call", &request).await?;

        let call = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.tool_calls)
            .and_then(|calls| calls.into_iter().next())
            .ok_or_else(|| LlmError::InvalidResponse("No tool call in response".to_string()))?;

        if call.function.name != tool.name() {
            return Err(LlmError::InvalidResponse(format!(
                "Expected call to {}, got {}",
                tool.name(),
                call.function.name
            )));
        }

        serde_json::from_str(&call.function.arguments)
            .map_err(|e| LlmError::InvalidResponse(format!("Malformed tool arguments: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    fn config_for(server: &mockito::Server, attempts: usize) -> LlmConfig {
        LlmConfig {
            endpoint: format!("{}/v1/chat/completions", server.url()),
            api_key: Some(SecretString::new("test-key".to_string())),
            max_attempts: attempts,
            timeout_ms: 2000,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "You are helpful."},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"choices": [{"message": {"role": "assistant", "content": "Hello!"}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::new(config_for(&server, 1)).unwrap();
        let messages = vec![ChatMessage::system("You are helpful."), ChatMessage::user("Hi")];
        let reply = client.complete(&messages, "test-model").await.unwrap();

        assert_eq!(reply, "Hello!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_retries_then_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream down")
            .expect(2)
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::new(config_for(&server, 2)).unwrap();
        let result = client.complete(&[ChatMessage::user("Hi")], "m").await;

        match result {
            Err(LlmError::ApiError(msg)) => assert!(msg.contains("500")),
            other => panic!("expected API error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .expect(1)
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::new(config_for(&server, 3)).unwrap();
        let result = client.complete(&[ChatMessage::user("Hi")], "m").await;

        match result {
            Err(LlmError::ApiError(msg)) => assert!(msg.contains("401")),
            other => panic!("expected API error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .expect(2)
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::new(config_for(&server, 2)).unwrap();
        let result = client.complete(&[ChatMessage::user("Hi")], "m").await;

        assert!(matches!(result, Err(LlmError::ApiError(_))));
        mock.assert_async().await;
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"choices": []}).to_string())
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::new(config_for(&server, 1)).unwrap();
        let result = client.complete(&[ChatMessage::user("Hi")], "m").await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_call_function_decodes_arguments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({
                "tool_choice": {"type": "function", "function": {"name": "extract_info"}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "extract_info",
                            "arguments": "{\"name\": \"Mike\", \"age\": null}"
                        }
                    }]
                }}]})
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::new(config_for(&server, 1)).unwrap();
        let tool = ToolDefinition::function("extract_info", json!({"type": "object"}));
        let args = client
            .call_function(&[ChatMessage::user("Extract from: hi")], "m", &tool)
            .await
            .unwrap();

        assert_eq!(args["name"], "Mike");
        assert!(args["age"].is_null());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_function_without_tool_call_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"choices": [{"message": {"content": "no"}}]}).to_string())
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::new(config_for(&server, 1)).unwrap();
        let tool = ToolDefinition::function("extract_info", json!({"type": "object"}));
        let result = client.call_function(&[ChatMessage::user("x")], "m", &tool).await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }
}
