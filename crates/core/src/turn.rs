//! Conversation session and turn domain types.
//!
//! A session groups turns; its id is minted once and stays stable until an
//! explicit reset. Turn records are append-only — the core never edits or
//! deletes one after insertion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Store-assigned row id.
    pub id: i64,

    /// The session this turn belongs to.
    pub session_id: SessionId,

    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,

    /// The user's query text.
    pub user_query: String,

    /// The assistant's response text.
    pub assistant_response: String,

    /// Which backend model answered (e.g. "primary", "local").
    pub model: String,

    /// Total tokens consumed by the exchange.
    pub tokens_used: u32,

    /// Estimated cost in USD.
    pub cost_usd: f64,

    /// The classified intent, as its stable string form.
    pub intent: String,

    /// Classification confidence in [0, 1].
    pub confidence: f64,
}

/// Who authored an in-memory buffer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single entry in the manager's short-term message buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferedMessage {
    pub role: Role,
    pub content: String,
}

impl BufferedMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}
