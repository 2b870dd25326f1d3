//! ModelBackend trait — the abstraction over LLM backends.
//!
//! A backend knows how to send a system prompt plus user message to a
//! language model and return the generated text with token usage.
//!
//! Implementations: Anthropic (primary remote), OpenAI (secondary remote),
//! Ollama subprocess (local).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::turn::{BufferedMessage, Role};

/// Which of the three routing slots a backend occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Primary remote API — best reasoning quality.
    Primary,
    /// Secondary remote API — best at structured/code generation.
    Secondary,
    /// Local subprocess model — data never leaves the machine.
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System instructions.
    pub system_prompt: String,

    /// The user's message (context already appended by the router).
    pub user_message: String,

    /// Prior conversation messages, oldest first. Each adapter frames these
    /// in its own wire format.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<BufferedMessage>,

    /// Maximum tokens to generate. Adapters apply their own default when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
            history: Vec::new(),
            max_tokens: None,
        }
    }

    pub fn with_history(mut self, history: Vec<BufferedMessage>) -> Self {
        self.history = history;
        self
    }
}

/// A complete response from a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text.
    pub text: String,

    /// Which concrete model produced it (e.g. "claude-sonnet-4-20250514").
    pub model: String,

    /// Tokens consumed by the prompt.
    pub input_tokens: u32,

    /// Tokens generated.
    pub output_tokens: u32,
}

impl GenerationResponse {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// The core ModelBackend trait.
///
/// Each backend is an opaque single-shot call: prompt in, text plus usage
/// out. Message framing differences (system-as-field vs system-in-list,
/// chat templates) live entirely inside the adapter.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// A human-readable name for this backend (e.g. "anthropic", "ollama").
    fn name(&self) -> &str;

    /// Which routing slot this backend serves.
    fn kind(&self) -> BackendKind;

    /// Generate a response.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, BackendError>;

    /// Liveness probe consulted by the router's fallback rule.
    ///
    /// Remote backends report `true` (failures surface at call time); the
    /// local adapter checks its runtime dependency.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Render history in a simple "role: content" transcript, used by adapters
/// that inline history into a single prompt.
pub fn transcript(history: &[BufferedMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_string_form() {
        assert_eq!(BackendKind::Primary.as_str(), "primary");
        assert_eq!(BackendKind::Local.to_string(), "local");
    }

    #[test]
    fn request_builder() {
        let req = GenerationRequest::new("sys", "hello")
            .with_history(vec![BufferedMessage::user("earlier")]);
        assert_eq!(req.system_prompt, "sys");
        assert_eq!(req.history.len(), 1);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn total_tokens_sums_both_sides() {
        let resp = GenerationResponse {
            text: "ok".into(),
            model: "m".into(),
            input_tokens: 120,
            output_tokens: 30,
        };
        assert_eq!(resp.total_tokens(), 150);
    }

    #[test]
    fn transcript_rendering() {
        let history = vec![
            BufferedMessage::user("What was my BP?"),
            BufferedMessage::assistant("134/84 mmHg."),
        ];
        let text = transcript(&history);
        assert!(text.starts_with("user: What was my BP?"));
        assert!(text.contains("assistant: 134/84 mmHg."));
    }
}
