//! # VitaCoach Engine
//!
//! The orchestration core: intent classification, context retrieval, model
//! routing, conversation management, and the proactive features (what-if
//! scenarios, morning briefings, health alerts).
//!
//! Everything here works against the `HealthStore`, `SemanticIndex`, and
//! `ModelBackend` traits from `vitacoach-core`; concrete SQLite and HTTP
//! implementations are injected by the binary.

pub mod alerts;
pub mod briefing;
pub mod context;
pub mod intent;
pub mod manager;
pub mod pricing;
pub mod router;
pub mod scenario;

mod util;

#[cfg(test)]
pub(crate) mod testutil;

pub use alerts::AlertEngine;
pub use briefing::BriefingGenerator;
pub use context::{ContextBundle, ContextRetriever};
pub use intent::IntentClassifier;
pub use manager::{ConversationManager, QueryOutcome};
pub use router::{Complexity, ModelRouter, Privacy, QueryMetadata, RoutedResponse};
pub use scenario::{ScenarioAnalyzer, ScenarioEngine};
