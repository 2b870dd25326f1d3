//! Model routing: privacy and complexity analysis plus backend selection.
//!
//! Routing policy, in order:
//! 1. Sensitive queries stay on the local model, no exceptions upward.
//! 2. Code/script generation goes to the secondary backend.
//! 3. High complexity goes to the primary backend.
//! 4. Medium complexity goes to secondary, or local under cost mode.
//! 5. Everything else goes local.
//!
//! A selected-but-unavailable local backend falls back to primary (the
//! privacy rule is a preference for keeping data local, not a guarantee —
//! the fallback keeps the assistant answering).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use vitacoach_core::error::BackendError;
use vitacoach_core::turn::BufferedMessage;
use vitacoach_core::{BackendKind, GenerationRequest, ModelBackend};

/// Privacy sensitivity, most restrictive last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
    Sensitive,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Sensitive => "sensitive",
        }
    }
}

/// Query complexity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Routing axes derived from query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMetadata {
    pub privacy: Privacy,
    pub complexity: Complexity,
    pub requires_code: bool,
}

const SENSITIVE_TERMS: [&str; 5] = ["medication", "drug", "mental", "anxiety", "depression"];
const PRIVATE_TERMS: [&str; 3] = ["doctor", "prescription", "diagnosis"];
const HIGH_COMPLEXITY: [&str; 6] = ["why", "explain", "analyze", "what if", "predict", "recommend"];
const MEDIUM_COMPLEXITY: [&str; 4] = ["how", "compare", "trend", "pattern"];

/// Derive the routing axes from query text alone.
pub fn classify_query(query: &str) -> QueryMetadata {
    let lower = query.to_lowercase();

    let privacy = if SENSITIVE_TERMS.iter().any(|t| lower.contains(t)) {
        Privacy::Sensitive
    } else if PRIVATE_TERMS.iter().any(|t| lower.contains(t)) {
        Privacy::Private
    } else {
        Privacy::Public
    };

    let complexity = if HIGH_COMPLEXITY.iter().any(|t| lower.contains(t)) {
        Complexity::High
    } else if MEDIUM_COMPLEXITY.iter().any(|t| lower.contains(t)) {
        Complexity::Medium
    } else {
        Complexity::Low
    };

    let requires_code = lower.contains("code") || lower.contains("script");

    QueryMetadata {
        privacy,
        complexity,
        requires_code,
    }
}

/// A completed routed generation.
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub text: String,

    /// Which routing slot answered.
    pub routed: BackendKind,

    /// The concrete model label reported by the backend.
    pub model: String,

    pub privacy: Privacy,
    pub complexity: Complexity,

    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl RoutedResponse {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Routes queries across the three backend slots.
///
/// Secondary and local slots are optional; a missing slot resolves to
/// primary the same way an unavailable local does.
pub struct ModelRouter {
    primary: Arc<dyn ModelBackend>,
    secondary: Option<Arc<dyn ModelBackend>>,
    local: Option<Arc<dyn ModelBackend>>,
    cost_mode: bool,
}

impl ModelRouter {
    pub fn new(
        primary: Arc<dyn ModelBackend>,
        secondary: Option<Arc<dyn ModelBackend>>,
        local: Option<Arc<dyn ModelBackend>>,
        cost_mode: bool,
    ) -> Self {
        Self {
            primary,
            secondary,
            local,
            cost_mode,
        }
    }

    /// Pure policy: which slot a query with these axes should go to.
    pub fn select_backend(&self, metadata: &QueryMetadata) -> BackendKind {
        if metadata.privacy == Privacy::Sensitive {
            return BackendKind::Local;
        }
        if metadata.requires_code {
            return BackendKind::Secondary;
        }
        match metadata.complexity {
            Complexity::High => BackendKind::Primary,
            Complexity::Medium => {
                if self.cost_mode {
                    BackendKind::Local
                } else {
                    BackendKind::Secondary
                }
            }
            Complexity::Low => BackendKind::Local,
        }
    }

    /// Resolve a selected slot to a live backend, applying fallbacks.
    async fn resolve(&self, selected: BackendKind) -> Arc<dyn ModelBackend> {
        match selected {
            BackendKind::Primary => Arc::clone(&self.primary),
            BackendKind::Secondary => self
                .secondary
                .as_ref()
                .map(Arc::clone)
                .unwrap_or_else(|| Arc::clone(&self.primary)),
            BackendKind::Local => match &self.local {
                Some(local) if local.is_available().await => Arc::clone(local),
                _ => {
                    info!("Local backend unavailable, falling back to primary");
                    Arc::clone(&self.primary)
                }
            },
        }
    }

    /// Classify, select, resolve, and dispatch one query.
    ///
    /// `context` is appended to the user message when non-empty; history is
    /// forwarded untouched for the adapter to frame.
    pub async fn route(
        &self,
        query: &str,
        system_prompt: &str,
        context: &str,
        history: Vec<BufferedMessage>,
        max_tokens: Option<u32>,
    ) -> Result<RoutedResponse, BackendError> {
        let metadata = classify_query(query);
        let selected = self.select_backend(&metadata);
        let backend = self.resolve(selected).await;

        debug!(
            privacy = metadata.privacy.as_str(),
            complexity = metadata.complexity.as_str(),
            requires_code = metadata.requires_code,
            selected = %selected,
            backend = backend.name(),
            "Routing query"
        );

        let user_message = if context.trim().is_empty() {
            query.to_string()
        } else {
            format!("{query}\n\nContext:\n{context}")
        };

        let mut request = GenerationRequest::new(system_prompt, user_message);
        request.history = history;
        request.max_tokens = max_tokens;

        let response = backend.generate(request).await?;

        Ok(RoutedResponse {
            text: response.text,
            routed: backend.kind(),
            model: response.model,
            privacy: metadata.privacy,
            complexity: metadata.complexity,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBackend;

    fn router_with(
        local_available: bool,
        cost_mode: bool,
    ) -> (ModelRouter, Arc<MockBackend>, Arc<MockBackend>, Arc<MockBackend>) {
        let primary = Arc::new(MockBackend::new("primary-mock", BackendKind::Primary, true));
        let secondary = Arc::new(MockBackend::new(
            "secondary-mock",
            BackendKind::Secondary,
            true,
        ));
        let local = Arc::new(MockBackend::new(
            "local-mock",
            BackendKind::Local,
            local_available,
        ));
        let router = ModelRouter::new(
            Arc::clone(&primary) as Arc<dyn ModelBackend>,
            Some(Arc::clone(&secondary) as Arc<dyn ModelBackend>),
            Some(Arc::clone(&local) as Arc<dyn ModelBackend>),
            cost_mode,
        );
        (router, primary, secondary, local)
    }

    #[test]
    fn privacy_detection_priority() {
        // Sensitive term outranks private term
        let meta = classify_query("should I ask my doctor about this medication?");
        assert_eq!(meta.privacy, Privacy::Sensitive);

        let private = classify_query("what did my doctor say about my diagnosis?");
        assert_eq!(private.privacy, Privacy::Private);

        let public = classify_query("what was my bp yesterday?");
        assert_eq!(public.privacy, Privacy::Public);
    }

    #[test]
    fn complexity_detection() {
        assert_eq!(classify_query("why is my bp high?").complexity, Complexity::High);
        assert_eq!(
            classify_query("compare weekday and weekend bp").complexity,
            Complexity::Medium
        );
        assert_eq!(classify_query("list my steps").complexity, Complexity::Low);
        // Substring containment: "show" contains "how"
        assert_eq!(
            classify_query("show me my steps").complexity,
            Complexity::Medium
        );
    }

    #[test]
    fn code_detection() {
        assert!(classify_query("write a script to chart my bp").requires_code);
        assert!(classify_query("give me code for this").requires_code);
        assert!(!classify_query("what was my bp?").requires_code);
    }

    #[test]
    fn sensitive_overrides_everything() {
        let (router, ..) = router_with(true, false);
        // Sensitive + high complexity + code, still local
        let meta = classify_query("predict my anxiety and write a script about it");
        assert_eq!(meta.privacy, Privacy::Sensitive);
        assert!(meta.requires_code);
        assert_eq!(router.select_backend(&meta), BackendKind::Local);
    }

    #[test]
    fn code_beats_complexity() {
        let (router, ..) = router_with(true, false);
        let meta = classify_query("explain this and write a script for it");
        assert_eq!(meta.complexity, Complexity::High);
        assert_eq!(router.select_backend(&meta), BackendKind::Secondary);
    }

    #[test]
    fn complexity_tiers_route_as_specified() {
        let (router, ..) = router_with(true, false);

        let high = classify_query("why was my bp elevated?");
        assert_eq!(router.select_backend(&high), BackendKind::Primary);

        let medium = classify_query("compare my sleep patterns");
        assert_eq!(router.select_backend(&medium), BackendKind::Secondary);

        let low = classify_query("list my steps");
        assert_eq!(router.select_backend(&low), BackendKind::Local);
    }

    #[test]
    fn cost_mode_pushes_medium_local() {
        let (router, ..) = router_with(true, true);
        let medium = classify_query("compare my sleep patterns");
        assert_eq!(router.select_backend(&medium), BackendKind::Local);
    }

    #[tokio::test]
    async fn route_dispatches_to_selected_backend() {
        let (router, _primary, _secondary, local) = router_with(true, false);
        let result = router
            .route("list my steps", "system", "", vec![], None)
            .await
            .unwrap();

        assert_eq!(result.routed, BackendKind::Local);
        assert_eq!(local.calls(), 1);
        assert_eq!(result.privacy, Privacy::Public);
        assert_eq!(result.complexity, Complexity::Low);
    }

    #[tokio::test]
    async fn unavailable_local_falls_back_to_primary() {
        let (router, primary, _secondary, local) = router_with(false, false);
        let result = router
            .route("list my steps", "system", "", vec![], None)
            .await
            .unwrap();

        assert_eq!(result.routed, BackendKind::Primary);
        assert_eq!(primary.calls(), 1);
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn missing_secondary_falls_back_to_primary() {
        let primary = Arc::new(MockBackend::new("primary-mock", BackendKind::Primary, true));
        let router = ModelRouter::new(
            Arc::clone(&primary) as Arc<dyn ModelBackend>,
            None,
            None,
            false,
        );

        let result = router
            .route("write a script for this", "system", "", vec![], None)
            .await
            .unwrap();
        assert_eq!(result.routed, BackendKind::Primary);
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn context_appended_to_user_message() {
        let (router, _primary, _secondary, local) = router_with(true, false);
        router
            .route(
                "list my steps",
                "system",
                "Recent data:\n- 2025-06-17: 9000 steps",
                vec![],
                None,
            )
            .await
            .unwrap();

        let seen = local.last_request().unwrap();
        assert!(seen.user_message.starts_with("list my steps"));
        assert!(seen.user_message.contains("\n\nContext:\nRecent data:"));
    }

    #[tokio::test]
    async fn empty_context_leaves_query_untouched() {
        let (router, _primary, _secondary, local) = router_with(true, false);
        router
            .route("list my steps", "system", "  ", vec![], None)
            .await
            .unwrap();

        let seen = local.last_request().unwrap();
        assert_eq!(seen.user_message, "list my steps");
    }

    #[tokio::test]
    async fn backend_errors_propagate() {
        let primary = Arc::new(
            MockBackend::new("primary-mock", BackendKind::Primary, true).failing(),
        );
        let router = ModelRouter::new(primary as Arc<dyn ModelBackend>, None, None, false);

        let result = router
            .route("why is my bp high?", "system", "", vec![], None)
            .await;
        assert!(matches!(result, Err(BackendError::ApiError { .. })));
    }
}
