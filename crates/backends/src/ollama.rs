//! Local model backend via an `ollama` subprocess.
//!
//! Spawns `ollama run <model>` per request, feeding the prompt on stdin and
//! reading the full response from stdout. Nothing leaves the machine, which
//! is why the router sends privacy-sensitive queries here.
//!
//! Ollama does not report token usage, so both sides are approximated by
//! whitespace word count.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use vitacoach_core::backend::transcript;
use vitacoach_core::error::BackendError;
use vitacoach_core::{BackendKind, GenerationRequest, GenerationResponse, ModelBackend};

/// Local Ollama backend (the local routing slot).
pub struct OllamaBackend {
    model: String,
    timeout: std::time::Duration,
}

impl OllamaBackend {
    pub fn new(model: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self {
            model: model.into(),
            timeout,
        }
    }

    /// Render the request into a single prompt for stdin.
    fn build_prompt(request: &GenerationRequest) -> String {
        let mut prompt = String::new();
        if !request.system_prompt.is_empty() {
            prompt.push_str(&request.system_prompt);
            prompt.push_str("\n\n");
        }
        if !request.history.is_empty() {
            prompt.push_str(&transcript(&request.history));
            prompt.push('\n');
        }
        prompt.push_str("user: ");
        prompt.push_str(&request.user_message);
        prompt.push_str("\nassistant:");
        prompt
    }

    fn approx_tokens(text: &str) -> u32 {
        text.split_whitespace().count() as u32
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let prompt = Self::build_prompt(&request);

        debug!(backend = "ollama", model = %self.model, "Spawning local generation");

        let mut child = Command::new("ollama")
            .arg("run")
            .arg(&self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BackendError::Unavailable(format!("Failed to spawn ollama: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| BackendError::Unavailable(format!("ollama stdin: {e}")))?;
            // Close stdin so the subprocess sees EOF and generates
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                BackendError::Timeout(format!(
                    "ollama run {} exceeded {}s",
                    self.model,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| BackendError::Unavailable(format!("ollama wait: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(model = %self.model, stderr = %stderr, "ollama run failed");
            return Err(BackendError::Unavailable(format!(
                "ollama exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();

        Ok(GenerationResponse {
            input_tokens: Self::approx_tokens(&prompt),
            output_tokens: Self::approx_tokens(&text),
            text,
            model: self.model.clone(),
        })
    }

    /// Probe `ollama list` for the configured model tag.
    async fn is_available(&self) -> bool {
        let result = Command::new("ollama")
            .arg("list")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                let listing = String::from_utf8_lossy(&output.stdout);
                listing
                    .lines()
                    .any(|line| line.split_whitespace().next().is_some_and(|tag| {
                        tag == self.model || tag.starts_with(&format!("{}:", self.model))
                    }))
            }
            _ => false,
        }
    }
}
