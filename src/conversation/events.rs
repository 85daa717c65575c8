//! Observer hook for buffer maintenance events

use super::truncation::TruncationStage;
use serde::Serialize;
use tracing::{info, warn};

/// Something the session did to its buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BufferEvent {
    /// A truncation stage found the buffer over its limit
    Truncated {
        stage: TruncationStage,
        limit: usize,
        removed: usize,
        remaining: usize,
    },
    /// Older history was replaced by a summary marker
    Compacted {
        turn: u64,
        replaced: usize,
        remaining: usize,
    },
    /// The summarizer failed; history was left untouched
    CompactionAbsorbed { turn: u64, reason: String },
}

/// Receives buffer events. Must not block.
pub trait BufferObserver: Send + Sync {
    fn on_event(&self, event: &BufferEvent);
}

/// Default observer that reports events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BufferObserver for TracingObserver {
    fn on_event(&self, event: &BufferEvent) {
        match event {
            BufferEvent::Truncated {
                stage,
                limit,
                removed,
                remaining,
            } => info!(
                stage = %stage,
                limit,
                removed,
                remaining,
                "Truncated history"
            ),
            BufferEvent::Compacted {
                turn,
                replaced,
                remaining,
            } => info!(turn, replaced, remaining, "Summarized history"),
            BufferEvent::CompactionAbsorbed { turn, reason } => {
                warn!(turn, reason = %reason, "Summarization failed, keeping full history")
            }
        }
    }
}
