//! Multi-turn conversation management.
//!
//! The manager owns the session: it classifies each query, retrieves
//! context, builds the system prompt, routes to a model, and records the
//! exchange. The in-memory buffer holds the last 10 messages and is what
//! backends see as history.
//!
//! A turn is persisted only after a successful generation; a backend error
//! propagates and leaves both the buffer and the store untouched.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::info;

use vitacoach_core::error::Error;
use vitacoach_core::store::NewTurn;
use vitacoach_core::turn::BufferedMessage;
use vitacoach_core::{
    Baselines, ConversationTurn, HealthStore, IntentKind, SessionId, UserProfile,
};

use crate::context::ContextRetriever;
use crate::intent::IntentClassifier;
use crate::pricing::cost_for;
use crate::router::ModelRouter;
use crate::util::group_thousands;

/// Messages kept in the in-memory buffer (5 exchanges).
const BUFFER_LIMIT: usize = 10;

/// What one processed query returns to the caller.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub response: String,
    pub session_id: SessionId,
    pub intent: IntentKind,
    pub confidence: f64,

    /// Concrete model label that answered (e.g. "claude-sonnet-4-20250514").
    pub model_used: String,

    pub tokens: u32,
    pub cost_usd: f64,
}

/// Orchestrates one session's queries end to end.
pub struct ConversationManager {
    classifier: IntentClassifier,
    retriever: ContextRetriever,
    router: ModelRouter,
    store: Arc<dyn HealthStore>,
    profile: UserProfile,
    session_id: SessionId,
    buffer: Vec<BufferedMessage>,
}

impl ConversationManager {
    pub fn new(
        retriever: ContextRetriever,
        router: ModelRouter,
        store: Arc<dyn HealthStore>,
        profile: UserProfile,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            retriever,
            router,
            store,
            profile,
            session_id: SessionId::new(),
            buffer: Vec::new(),
        }
    }

    /// Resume an existing session instead of minting a fresh id.
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Process one query using the local calendar date.
    pub async fn process_query(&mut self, query: &str) -> Result<QueryOutcome, Error> {
        self.process_query_at(query, Local::now().date_naive()).await
    }

    /// Deterministic core: relative dates resolve against `today`.
    pub async fn process_query_at(
        &mut self,
        query: &str,
        today: NaiveDate,
    ) -> Result<QueryOutcome, Error> {
        let intent = self.classifier.classify_at(query, today);

        let bundle = self
            .retriever
            .retrieve(query, &intent, Some(&self.session_id), today)
            .await?;

        let system_prompt = build_system_prompt(&self.profile, &bundle.baselines);

        let routed = self
            .router
            .route(
                query,
                &system_prompt,
                &bundle.render(),
                self.buffer.clone(),
                None,
            )
            .await?;

        // Generation succeeded; now update the buffer and the log.
        self.buffer.push(BufferedMessage::user(query));
        self.buffer.push(BufferedMessage::assistant(&routed.text));
        if self.buffer.len() > BUFFER_LIMIT {
            let excess = self.buffer.len() - BUFFER_LIMIT;
            self.buffer.drain(..excess);
        }

        let tokens = routed.total_tokens();
        let cost_usd = cost_for(routed.routed, tokens);

        self.store
            .append_turn(NewTurn {
                session_id: &self.session_id,
                user_query: query,
                assistant_response: &routed.text,
                model: routed.routed.as_str(),
                tokens_used: tokens,
                cost_usd,
                intent: intent.kind.as_str(),
                confidence: intent.confidence,
            })
            .await?;

        info!(
            session = %self.session_id,
            intent = %intent.kind,
            model = %routed.model,
            tokens,
            "Turn recorded"
        );

        Ok(QueryOutcome {
            response: routed.text,
            session_id: self.session_id.clone(),
            intent: intent.kind,
            confidence: intent.confidence,
            model_used: routed.model,
            tokens,
            cost_usd,
        })
    }

    /// Recent persisted turns for this session, newest first.
    pub async fn history(&self, limit: u32) -> Result<Vec<ConversationTurn>, Error> {
        Ok(self.store.recent_turns(&self.session_id, limit).await?)
    }

    /// Start a fresh session: new id, empty buffer. Persisted turns remain.
    pub fn reset(&mut self) {
        self.session_id = SessionId::new();
        self.buffer.clear();
    }

    #[cfg(test)]
    fn buffer(&self) -> &[BufferedMessage] {
        &self.buffer
    }
}

/// Render the system prompt from profile and 90-day baselines.
///
/// Missing baselines render as "N/A" rather than being omitted, so the
/// model knows the data is absent instead of guessing.
pub fn build_system_prompt(profile: &UserProfile, baselines: &Baselines) -> String {
    let systolic = baselines
        .avg_systolic
        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.0}"));
    let sleep = baselines
        .avg_sleep
        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
    let steps = baselines
        .avg_steps
        .map_or_else(|| "N/A".to_string(), |v| group_thousands(v.round() as i64));

    format!(
        "You are an AI health coach for {name}.\n\
         \n\
         USER PROFILE:\n\
         - BP Goal: <{bp_goal:.0} mmHg\n\
         - Sleep Goal: {sleep_goal} hours\n\
         - Steps Goal: {steps_goal} steps\n\
         - VO2 Max Goal: {vo2_goal}\n\
         \n\
         USER BASELINES (90-day averages):\n\
         - Average Systolic BP: {systolic} mmHg\n\
         - Average Sleep: {sleep} hours\n\
         - Average Steps: {steps}\n\
         \n\
         KEY PATTERNS (from prior analysis):\n\
         - VO2 Max: r=-0.494 with BP (strongest factor)\n\
         - Sleep: r=-0.375 with BP\n\
         - Steps: r=-0.187 with BP\n\
         - Weekend BP: +4.8 mmHg higher\n\
         - Sleep <6hrs: +6.2 mmHg\n\
         \n\
         INSTRUCTIONS:\n\
         1. Provide personalized, evidence-based responses\n\
         2. Reference the user's actual data and patterns\n\
         3. Always report blood pressure as Systolic/Diastolic (e.g., \"134/84 mmHg\")\n\
         4. Give specific, actionable recommendations\n\
         5. Acknowledge uncertainty when appropriate\n\
         6. Never diagnose or prescribe - suggest consulting a doctor for concerns\n\
         7. Be encouraging but realistic\n\
         \n\
         Keep responses concise but informative.",
        name = profile.name,
        bp_goal = profile.bp_goal,
        sleep_goal = profile.sleep_goal,
        steps_goal = group_thousands(profile.steps_goal),
        vo2_goal = profile.vo2_max_goal,
    )
}
