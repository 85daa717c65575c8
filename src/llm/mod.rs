//! Collaborators around the generative-text backend
//!
//! The conversation core only sees the traits defined here; the
//! OpenAI-compatible HTTP client is one implementation of them.

pub mod backend;
pub mod client;
pub mod summarizer;
pub mod types;

pub use backend::{CompletionBackend, FunctionCallBackend, LlmError};
pub use client::OpenAiCompatibleClient;
pub use summarizer::{ConcatenationSummarizer, LlmSummarizer, Summarizer};
pub use types::{ChatMessage, ToolDefinition};
