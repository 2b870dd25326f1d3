//! Store traits — the structured store and the semantic index.
//!
//! The orchestration core only ever talks to these traits; concrete
//! implementations (SQLite, in-memory test doubles) are injected at
//! construction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::metrics::{Baselines, DailyMetric};
use crate::turn::{ConversationTurn, SessionId};

/// A new turn to be appended to the conversation log.
#[derive(Debug, Clone)]
pub struct NewTurn<'a> {
    pub session_id: &'a SessionId,
    pub user_query: &'a str,
    pub assistant_response: &'a str,
    pub model: &'a str,
    pub tokens_used: u32,
    pub cost_usd: f64,
    pub intent: &'a str,
    pub confidence: f64,
}

/// Alert priority levels, ordered most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Critical,
    Warning,
    Info,
    Celebration,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Celebration => "celebration",
        }
    }
}

/// What kind of pattern an alert describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PoorSleepStreak,
    BpSpike,
    BpLow,
    StreakAchieved,
    GoalAchieved,
    TrendWarning,
    TrendPositive,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoorSleepStreak => "poor_sleep_streak",
            Self::BpSpike => "bp_spike",
            Self::BpLow => "bp_low",
            Self::StreakAchieved => "streak_achieved",
            Self::GoalAchieved => "goal_achieved",
            Self::TrendWarning => "trend_warning",
            Self::TrendPositive => "trend_positive",
        }
    }
}

/// A detected health alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAlert {
    /// Store-assigned id; 0 before persistence.
    #[serde(default)]
    pub id: i64,

    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,

    /// Structured payload backing the message (values, thresholds).
    #[serde(default)]
    pub data: serde_json::Value,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub acknowledged: bool,
}

/// The structured store: daily metrics, conversation log, alerts.
///
/// Data-absence is never an error here: a missing row is `None`, an empty
/// window is an empty vec, an all-absent baseline column is `None`.
#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Fetch the row for one date, if present.
    async fn get_metric(&self, date: NaiveDate)
        -> std::result::Result<Option<DailyMetric>, StoreError>;

    /// Fetch rows in the inclusive range, ordered by date descending.
    async fn get_metrics(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<DailyMetric>, StoreError>;

    /// Trailing 90-day averages; fields with no contributing data are absent.
    async fn get_baselines(&self) -> std::result::Result<Baselines, StoreError>;

    /// Append a turn to the conversation log. Returns the new row id.
    async fn append_turn(&self, turn: NewTurn<'_>) -> std::result::Result<i64, StoreError>;

    /// The most recent turns for a session, newest first.
    async fn recent_turns(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> std::result::Result<Vec<ConversationTurn>, StoreError>;

    /// Persist a detected alert. Returns the new row id.
    async fn append_alert(&self, alert: &HealthAlert) -> std::result::Result<i64, StoreError>;

    /// Unacknowledged alerts, most urgent first, then newest first.
    async fn unacknowledged_alerts(
        &self,
        limit: u32,
    ) -> std::result::Result<Vec<HealthAlert>, StoreError>;

    /// Mark an alert acknowledged. Returns whether a row was updated.
    async fn acknowledge_alert(&self, id: i64) -> std::result::Result<bool, StoreError>;
}

/// A semantic neighbour returned by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarDay {
    /// One-line natural-language summary of the day.
    pub summary: String,

    /// Structured metadata (date, key metric values).
    pub metadata: serde_json::Value,

    /// Distance from the query; smaller is nearer.
    pub distance: f64,
}

/// The semantic index over daily summaries.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Insert or overwrite the summary for a date. Idempotent.
    async fn upsert_summary(
        &self,
        date: NaiveDate,
        metric: &DailyMetric,
    ) -> std::result::Result<(), StoreError>;

    /// The k nearest summaries to the query text, nearest first.
    async fn query_similar(
        &self,
        text: &str,
        k: usize,
    ) -> std::result::Result<Vec<SimilarDay>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_priority_strings() {
        assert_eq!(AlertPriority::Warning.as_str(), "warning");
        assert_eq!(AlertKind::BpSpike.as_str(), "bp_spike");
    }

    #[test]
    fn similar_day_serialization() {
        let day = SimilarDay {
            summary: "2025-06-01: BP 134 mmHg (stage 1 hypertension).".into(),
            metadata: serde_json::json!({"date": "2025-06-01", "systolic": 134.0}),
            distance: 0.42,
        };
        let json = serde_json::to_string(&day).unwrap();
        assert!(json.contains("stage 1"));
        assert!(json.contains("0.42"));
    }
}
