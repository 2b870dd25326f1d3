//! Model backend adapters for VitaCoach.
//!
//! Three implementations of [`vitacoach_core::ModelBackend`]:
//! - [`AnthropicBackend`] — Anthropic Messages API (primary)
//! - [`OpenAiBackend`] — OpenAI-compatible chat completions (secondary)
//! - [`OllamaBackend`] — local model via an `ollama` subprocess
//!
//! Each adapter owns its wire framing; the engine only sees the trait.

pub mod anthropic;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
