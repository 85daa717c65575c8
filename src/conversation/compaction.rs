//! Periodic summarization of older history

use super::buffer::ConversationBuffer;
use super::message::Message;
use crate::llm::Summarizer;
use std::sync::Arc;
use tracing::debug;

/// Newest entries left untouched by a compaction
pub const KEEP_RECENT: usize = 2;

/// Compaction requires strictly more entries than this
pub const MIN_ENTRIES: usize = 3;

/// Result of a compaction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// Not a compaction turn, or too few entries
    NotDue,
    /// `replaced` entries were collapsed into one summary marker
    Compacted { replaced: usize, kept: usize },
    /// The summarizer failed and the buffer was left unchanged
    Absorbed { reason: String },
}

impl CompactionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CompactionOutcome::NotDue => "not_due",
            CompactionOutcome::Compacted { .. } => "compacted",
            CompactionOutcome::Absorbed { .. } => "absorbed",
        }
    }
}

/// Decides when to summarize and rewrites the buffer around the digest
pub struct CompactionController {
    summarize_every: u64,
    summarizer: Arc<dyn Summarizer>,
}

impl CompactionController {
    pub fn new(summarize_every: u64, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            summarize_every,
            summarizer,
        }
    }

    /// Every `summarize_every`-th turn, when the buffer holds more than
    /// [`MIN_ENTRIES`] entries
    pub fn is_due(&self, buffer: &ConversationBuffer) -> bool {
        self.summarize_every > 0
            && buffer.turn_count() % self.summarize_every == 0
            && buffer.len() > MIN_ENTRIES
    }

    /// Compact if this turn is due for it
    pub async fn maybe_compact(&self, buffer: &mut ConversationBuffer) -> CompactionOutcome {
        if !self.is_due(buffer) {
            return CompactionOutcome::NotDue;
        }
        self.compact(buffer).await
    }

    /// Replace all but the newest [`KEEP_RECENT`] entries with a summary
    /// marker. Summarizer failures leave the buffer exactly as it was.
    pub async fn compact(&self, buffer: &mut ConversationBuffer) -> CompactionOutcome {
        if buffer.len() <= MIN_ENTRIES {
            return CompactionOutcome::NotDue;
        }

        let transcript = Self::transcript(buffer);
        debug!(
            "Summarizing {} entries after {} turns",
            buffer.len() - KEEP_RECENT,
            buffer.turn_count()
        );

        match self.summarizer.summarize(&transcript).await {
            Ok(digest) => {
                let replaced = buffer.collapse_older(KEEP_RECENT, Message::summary(&digest));
                CompactionOutcome::Compacted {
                    replaced,
                    kept: KEEP_RECENT,
                }
            }
            Err(e) => CompactionOutcome::Absorbed {
                reason: e.to_string(),
            },
        }
    }

    /// `role: content` lines for everything older than the kept tail
    pub fn transcript(buffer: &ConversationBuffer) -> String {
        buffer
            .older_than(KEEP_RECENT)
            .map(|m| format!("{}: {}", m.role(), m.content()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
