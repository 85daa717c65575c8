//! Count → character → word truncation cascade
//!
//! Each stage runs on the buffer left by the previous one. The character
//! and word stages never shrink the buffer below [`MIN_RETAINED`] entries,
//! so two oversized messages may still exceed those budgets.

use super::buffer::ConversationBuffer;
use super::message::Message;
use crate::config::ConversationConfig;
use serde::Serialize;
use std::fmt;

/// Floor for the character and word stages
pub const MIN_RETAINED: usize = 2;

/// Truncation stage, in cascade order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStage {
    Count,
    Chars,
    Words,
}

impl TruncationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruncationStage::Count => "count",
            TruncationStage::Chars => "chars",
            TruncationStage::Words => "words",
        }
    }
}

impl fmt::Display for TruncationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single stage did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: TruncationStage,
    pub limit: usize,
    /// The buffer was over this stage's limit when the stage started
    pub triggered: bool,
    pub removed: usize,
}

impl StageOutcome {
    fn new(stage: TruncationStage, limit: usize, triggered: bool, removed: usize) -> Self {
        Self {
            stage,
            limit,
            triggered,
            removed,
        }
    }
}

/// Result of one full cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TruncationReport {
    pub count: StageOutcome,
    pub chars: StageOutcome,
    pub words: StageOutcome,
    pub remaining: usize,
}

impl TruncationReport {
    pub fn stages(&self) -> [StageOutcome; 3] {
        [self.count, self.chars, self.words]
    }

    /// Total entries evicted across all stages
    pub fn removed(&self) -> usize {
        self.stages().iter().map(|s| s.removed).sum()
    }

    pub fn is_noop(&self) -> bool {
        self.stages().iter().all(|s| !s.triggered)
    }
}

/// The three budgets applied after compaction on every turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TruncationPolicy {
    pub max_messages: usize,
    pub max_chars: usize,
    pub max_words: usize,
}

impl TruncationPolicy {
    pub fn new(max_messages: usize, max_chars: usize, max_words: usize) -> Self {
        Self {
            max_messages,
            max_chars,
            max_words,
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(config.max_messages, config.max_chars, config.max_words)
    }

    /// Run the full cascade. Idempotent: a second call changes nothing.
    pub fn apply(&self, buffer: &mut ConversationBuffer) -> TruncationReport {
        let count = self.cap_count(buffer);
        let chars = self.cap_chars(buffer);
        let words = self.cap_words(buffer);

        TruncationReport {
            count,
            chars,
            words,
            remaining: buffer.len(),
        }
    }

    /// Keep only the newest `max_messages` entries
    pub fn cap_count(&self, buffer: &mut ConversationBuffer) -> StageOutcome {
        let triggered = buffer.len() > self.max_messages;
        let removed = buffer.retain_latest(self.max_messages);
        StageOutcome::new(TruncationStage::Count, self.max_messages, triggered, removed)
    }

    /// Evict oldest entries while total characters exceed `max_chars`
    pub fn cap_chars(&self, buffer: &mut ConversationBuffer) -> StageOutcome {
        let (triggered, removed) = evict_while_over(buffer, self.max_chars, Message::char_len);
        StageOutcome::new(TruncationStage::Chars, self.max_chars, triggered, removed)
    }

    /// Evict oldest entries while total words exceed `max_words`
    pub fn cap_words(&self, buffer: &mut ConversationBuffer) -> StageOutcome {
        let (triggered, removed) = evict_while_over(buffer, self.max_words, Message::word_count);
        StageOutcome::new(TruncationStage::Words, self.max_words, triggered, removed)
    }
}

fn evict_while_over(
    buffer: &mut ConversationBuffer,
    limit: usize,
    measure: fn(&Message) -> usize,
) -> (bool, usize) {
    let mut total: usize = buffer.iter().map(measure).sum();
    let triggered = total > limit;
    let mut removed = 0;

    while total > limit && buffer.len() > MIN_RETAINED {
        match buffer.evict_oldest() {
            Some(evicted) => {
                total -= measure(&evicted);
                removed += 1;
            }
            None => break,
        }
    }

    (triggered, removed)
}
