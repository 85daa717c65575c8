//! Bounded conversation context for chat clients backed by a
//! generative-text model.
//!
//! The core is the buffer policy applied on every turn: periodic
//! compaction of older history into a single summary message, followed by
//! a count → character → word truncation cascade. The model backend,
//! the summarizer and the structured extractor are collaborators behind
//! traits in [`llm`].

pub mod config;
pub mod conversation;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod logging;
pub mod metrics;

pub use crate::config::{Config, ConversationConfig, LlmConfig, LoggingConfig};
pub use conversation::{
    BufferEvent, BufferObserver, ChatSession, CompactionController, CompactionOutcome,
    ConversationBuffer, Message, Role, SessionStats, TruncationPolicy, TruncationReport,
};
pub use error::{ContextError, Result};
pub use extraction::{ContactRecord, InfoExtractor, ValidationReport};
pub use llm::{CompletionBackend, FunctionCallBackend, LlmError, OpenAiCompatibleClient, Summarizer};
