//! Ordered conversation history with turn and mutation counters

use super::message::Message;
use std::collections::VecDeque;

/// Chronological message buffer owned by a single session.
///
/// Entries are only ever appended at the back or removed from the front;
/// they are never reordered. `version` increases on every mutation.
#[derive(Debug, Clone, Default)]
pub struct ConversationBuffer {
    entries: VecDeque<Message>,
    turn_count: u64,
    version: u64,
}

impl ConversationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message and start a new turn. Returns the turn number.
    pub fn push_user(&mut self, content: impl Into<String>) -> u64 {
        self.entries.push_back(Message::user(content));
        self.turn_count += 1;
        self.version += 1;
        self.turn_count
    }

    /// Append an assistant reply to the current turn
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.entries.push_back(Message::assistant(content));
        self.version += 1;
    }

    /// Remove and return the oldest entry
    pub fn evict_oldest(&mut self) -> Option<Message> {
        let evicted = self.entries.pop_front();
        if evicted.is_some() {
            self.version += 1;
        }
        evicted
    }

    /// Keep only the newest `n` entries. Returns how many were dropped.
    pub fn retain_latest(&mut self, n: usize) -> usize {
        let excess = self.entries.len().saturating_sub(n);
        if excess > 0 {
            self.entries.drain(..excess);
            self.version += 1;
        }
        excess
    }

    /// Entries older than the newest `keep`, oldest first
    pub fn older_than(&self, keep: usize) -> impl Iterator<Item = &Message> {
        let count = self.entries.len().saturating_sub(keep);
        self.entries.iter().take(count)
    }

    /// Collapse everything older than the newest `keep` entries into
    /// `replacement`, placed in front of the kept ones. Returns how many
    /// entries were replaced.
    pub fn collapse_older(&mut self, keep: usize, replacement: Message) -> usize {
        let count = self.entries.len().saturating_sub(keep);
        self.entries.drain(..count);
        self.entries.push_front(replacement);
        self.version += 1;
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.entries.get(index)
    }

    /// Snapshot of the current entries
    pub fn to_vec(&self) -> Vec<Message> {
        self.entries.iter().cloned().collect()
    }

    /// Number of user turns seen so far; never decreases
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// Mutation counter
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn total_chars(&self) -> usize {
        self.entries.iter().map(Message::char_len).sum()
    }

    pub fn total_words(&self) -> usize {
        self.entries.iter().map(Message::word_count).sum()
    }
}
