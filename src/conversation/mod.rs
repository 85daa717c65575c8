//! Conversation buffer management
//!
//! Keeps a chat history bounded by message, character and word budgets,
//! compacting older turns into a summary on a fixed turn cadence.

pub mod buffer;
pub mod compaction;
pub mod events;
pub mod message;
pub mod session;
pub mod truncation;

pub use buffer::ConversationBuffer;
pub use compaction::{CompactionController, CompactionOutcome};
pub use events::{BufferEvent, BufferObserver, TracingObserver};
pub use message::{Message, Role};
pub use session::{ChatSession, HistoryEntry, SessionStats, DEFAULT_PREVIEW_CHARS};
pub use truncation::{StageOutcome, TruncationPolicy, TruncationReport, TruncationStage};
