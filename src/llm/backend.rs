//! Collaborator contracts for the text-generation backend

use super::types::{ChatMessage, ToolDefinition};
use async_trait::async_trait;

/// Plain chat completion
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete the ordered prompt and return the assistant text
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String, LlmError>;
}

/// Structured output through a forced function call
#[async_trait]
pub trait FunctionCallBackend: Send + Sync {
    /// Force a call to `tool` and return its decoded JSON arguments
    async fn call_function(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tool: &ToolDefinition,
    ) -> Result<serde_json::Value, LlmError>;
}

/// Backend errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown error")]
    Unknown,
}
