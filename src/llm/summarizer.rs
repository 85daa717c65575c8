//! Summarization collaborators used for history compaction

use super::backend::{CompletionBackend, LlmError};
use super::types::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const SUMMARY_INSTRUCTION: &str = "Summarize in 2 sentences.";

/// Summarizer trait for different summarization strategies
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense a role-prefixed transcript into a short digest
    async fn summarize(&self, transcript: &str) -> Result<String, LlmError>;
}

/// Model-backed summarizer asking for a two-sentence digest
pub struct LlmSummarizer {
    backend: Arc<dyn CompletionBackend>,
    model: String,
}

impl LlmSummarizer {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    fn build_messages(transcript: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SUMMARY_INSTRUCTION),
            ChatMessage::user(format!("Summarize: {}", transcript)),
        ]
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, LlmError> {
        if transcript.trim().is_empty() {
            return Ok(String::new());
        }

        debug!("Summarizing transcript of {} chars", transcript.chars().count());

        let messages = Self::build_messages(transcript);
        self.backend.complete(&messages, &self.model).await
    }
}

/// Offline fallback: joins transcript lines into one paragraph
pub struct ConcatenationSummarizer;

#[async_trait]
impl Summarizer for ConcatenationSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, LlmError> {
        Ok(transcript
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}
