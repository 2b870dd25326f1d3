//! OpenAI-compatible chat completions backend.
//!
//! Bearer-token authentication, system prompt as the first message in the
//! list. Works against api.openai.com or any compatible endpoint via
//! `with_base_url`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use vitacoach_core::error::BackendError;
use vitacoach_core::turn::Role;
use vitacoach_core::{BackendKind, GenerationRequest, GenerationResponse, ModelBackend};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// OpenAI-compatible backend (the secondary routing slot).
pub struct OpenAiBackend {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a new OpenAI backend.
    ///
    /// Fails with `NotConfigured` when no API key is available.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, BackendError> {
        let api_key = match api_key {
            Some(k) if !k.trim().is_empty() => k,
            _ => {
                return Err(BackendError::NotConfigured(
                    "OPENAI_API_KEY is not set".into(),
                ));
            }
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client,
        })
    }

    /// Override the generation cap applied when a request carries none.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the base URL (for testing or compatible endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Chat-completions framing: system first, then history, then the
    /// current user message.
    fn to_api_messages(request: &GenerationRequest) -> Vec<ApiMessage> {
        let mut messages = vec![ApiMessage {
            role: "system".into(),
            content: request.system_prompt.clone(),
        }];

        for m in &request.history {
            messages.push(ApiMessage {
                role: match m.role {
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                },
                content: m.content.clone(),
            });
        }

        messages.push(ApiMessage {
            role: "user".into(),
            content: request.user_message.clone(),
        });
        messages
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Secondary
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let messages = Self::to_api_messages(&request);
        let max_tokens = request.max_tokens.unwrap_or(self.max_tokens);

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_tokens,
        });

        debug!(backend = "openai", model = %self.model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout("OpenAI request timed out".into())
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(BackendError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "Invalid OpenAI API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "OpenAI API error");
            return Err(BackendError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: ApiResponse = response.json().await.map_err(|e| BackendError::ApiError {
            status_code: 200,
            message: format!("Failed to parse OpenAI response: {e}"),
        })?;

        let text = api_resp
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(GenerationResponse {
            text,
            model: api_resp.model,
            input_tokens: api_resp.usage.prompt_tokens,
            output_tokens: api_resp.usage.completion_tokens,
        })
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vitacoach_core::BufferedMessage;

    #[test]
    fn constructor_requires_key() {
        let missing = OpenAiBackend::new(None, "gpt-4o-mini", Duration::from_secs(1));
        assert!(matches!(missing, Err(BackendError::NotConfigured(_))));
    }

    #[test]
    fn system_message_comes_first() {
        let request = GenerationRequest::new("you are a health coach", "write a script")
            .with_history(vec![BufferedMessage::user("hi")]);

        let messages = OpenAiBackend::to_api_messages(&request);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "you are a health coach");
        assert_eq!(messages[2].content, "write a script");
    }

    #[test]
    fn parse_completion_response() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{
                "model": "gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": "Here is the script."}}],
                "usage": {"prompt_tokens": 180, "completion_tokens": 95, "total_tokens": 275}
            }"#,
        )
        .unwrap();

        assert_eq!(resp.choices[0].message.content, "Here is the script.");
        assert_eq!(resp.usage.completion_tokens, 95);
    }

    #[test]
    fn backend_identity() {
        let b = OpenAiBackend::new(Some("sk-test".into()), "gpt-4o-mini", Duration::from_secs(1))
            .unwrap();
        assert_eq!(b.name(), "openai");
        assert_eq!(b.kind(), BackendKind::Secondary);
    }
}
