//! A single conversation entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// Synthetic digest standing in for compacted history
    SummaryMarker,
}

impl Role {
    /// Role name sent to the backend. Summaries travel as assistant turns.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant | Role::SummaryMarker => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable message record.
///
/// Character and word counts are derived from `content` on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Wrap a digest as `[SUMMARY: <digest>]`
    pub fn summary(digest: &str) -> Self {
        Self::new(Role::SummaryMarker, format!("[SUMMARY: {}]", digest))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Length in Unicode scalar values
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Number of whitespace-delimited tokens
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn is_summary(&self) -> bool {
        self.role == Role::SummaryMarker
    }
}
