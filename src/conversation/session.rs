//! Per-session turn orchestration
//!
//! Each turn runs: append user message → maybe compact → truncate →
//! complete → append assistant reply. The reply is appended after
//! truncation, so between turns the buffer can sit one message above
//! its budgets until the next turn's truncation pass.

use super::buffer::ConversationBuffer;
use super::compaction::{CompactionController, CompactionOutcome};
use super::events::{BufferEvent, BufferObserver, TracingObserver};
use super::message::Role;
use super::truncation::{TruncationPolicy, TruncationReport};
use crate::config::ConversationConfig;
use crate::error::Result;
use crate::llm::{ChatMessage, CompletionBackend, Summarizer};
use crate::metrics::METRICS;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// Default preview width for [`ChatSession::history`]
pub const DEFAULT_PREVIEW_CHARS: usize = 60;

/// Buffer totals at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub messages: usize,
    pub characters: usize,
    pub words: usize,
    pub turns: u64,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} msgs, {} chars, {} words",
            self.messages, self.characters, self.words
        )
    }
}

/// One line of a history listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// 1-based position in the buffer
    pub index: usize,
    pub role: Role,
    pub preview: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}: {}", self.index, self.role, self.preview)
    }
}

/// A chat session owning its buffer exclusively
pub struct ChatSession {
    id: Uuid,
    config: ConversationConfig,
    buffer: ConversationBuffer,
    policy: TruncationPolicy,
    compactor: CompactionController,
    backend: Arc<dyn CompletionBackend>,
    observer: Arc<dyn BufferObserver>,
}

impl ChatSession {
    /// Create a session with an empty buffer
    pub fn new(
        config: ConversationConfig,
        backend: Arc<dyn CompletionBackend>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            policy: TruncationPolicy::from_config(&config),
            compactor: CompactionController::new(config.summarize_every, summarizer),
            config,
            buffer: ConversationBuffer::new(),
            backend,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the default tracing observer
    pub fn with_observer(mut self, observer: Arc<dyn BufferObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one full turn and return the assistant reply.
    ///
    /// A completion failure aborts the turn: the user message stays in the
    /// (compacted, truncated) buffer and no reply is appended.
    pub async fn process_turn(&mut self, user_text: impl Into<String>) -> Result<String> {
        let turn = self.buffer.push_user(user_text);
        let span = info_span!("turn", session = %self.id, turn);
        self.run_turn(turn).instrument(span).await
    }

    async fn run_turn(&mut self, turn: u64) -> Result<String> {
        let outcome = self.compactor.maybe_compact(&mut self.buffer).await;
        self.report_compaction(turn, &outcome);

        let report = self.policy.apply(&mut self.buffer);
        self.report_truncation(&report);

        let prompt = self.prompt();
        debug!("Sending {} prompt messages", prompt.len());

        let reply = self.backend.complete(&prompt, &self.config.model).await?;
        self.buffer.push_assistant(reply.clone());

        METRICS.record_turn(self.buffer.len());
        Ok(reply)
    }

    fn report_compaction(&self, turn: u64, outcome: &CompactionOutcome) {
        let event = match outcome {
            CompactionOutcome::NotDue => return,
            CompactionOutcome::Compacted { replaced, .. } => BufferEvent::Compacted {
                turn,
                replaced: *replaced,
                remaining: self.buffer.len(),
            },
            CompactionOutcome::Absorbed { reason } => BufferEvent::CompactionAbsorbed {
                turn,
                reason: reason.clone(),
            },
        };

        METRICS.record_compaction(outcome.label());
        self.observer.on_event(&event);
    }

    fn report_truncation(&self, report: &TruncationReport) {
        for stage in report.stages().iter().filter(|s| s.triggered) {
            METRICS.record_truncation(stage.stage.as_str(), stage.removed);
            self.observer.on_event(&BufferEvent::Truncated {
                stage: stage.stage,
                limit: stage.limit,
                removed: stage.removed,
                remaining: report.remaining,
            });
        }
    }

    /// System prompt followed by the buffered entries, oldest first
    pub fn prompt(&self) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(self.config.system_prompt.as_str()))
            .chain(
                self.buffer
                    .iter()
                    .map(|m| ChatMessage::new(m.role().as_str(), m.content())),
            )
            .collect()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            messages: self.buffer.len(),
            characters: self.buffer.total_chars(),
            words: self.buffer.total_words(),
            turns: self.buffer.turn_count(),
        }
    }

    /// Numbered entries with content cut to `preview_chars` characters
    pub fn history(&self, preview_chars: usize) -> Vec<HistoryEntry> {
        self.buffer
            .iter()
            .enumerate()
            .map(|(i, m)| HistoryEntry {
                index: i + 1,
                role: m.role(),
                preview: preview(m.content(), preview_chars),
            })
            .collect()
    }

    pub fn buffer(&self) -> &ConversationBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
