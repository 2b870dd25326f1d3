//! # VitaCoach Core
//!
//! Domain types, traits, and error definitions for the VitaCoach health
//! assistant. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (structured store, semantic index, model
//! backends) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod backend;
pub mod error;
pub mod intent;
pub mod metrics;
pub mod scenario;
pub mod store;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use backend::{BackendKind, GenerationRequest, GenerationResponse, ModelBackend};
pub use error::{BackendError, Error, Result, StoreError};
pub use intent::{ClassifiedIntent, DateScope, IntentKind, QueryEntities};
pub use metrics::{Baselines, DailyMetric, UserProfile};
pub use scenario::{Feasibility, ScenarioResult};
pub use store::{HealthAlert, HealthStore, NewTurn, SemanticIndex, SimilarDay};
pub use turn::{BufferedMessage, ConversationTurn, Role, SessionId};
