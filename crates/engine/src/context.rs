//! Context retrieval for model prompts.
//!
//! Pulls everything the model might need for one query: profile, 90-day
//! baselines, date-scoped metric rows, semantically similar days, recent
//! conversation turns, and intent-specific slices. Data absence is normal
//! here — an empty store produces empty slices, never an error.

use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::debug;

use vitacoach_core::error::StoreError;
use vitacoach_core::{
    Baselines, ClassifiedIntent, ConversationTurn, DailyMetric, HealthStore, IntentKind,
    SemanticIndex, SessionId, SimilarDay, UserProfile,
};

/// Everything retrieved for one query.
#[derive(Debug, Clone)]
pub struct ContextBundle {
    pub profile: UserProfile,
    pub baselines: Baselines,

    /// Rows for the resolved date scope, or the trailing 7 days.
    pub relevant_data: Vec<DailyMetric>,

    /// Top-3 semantically similar days, nearest first.
    pub similar_days: Vec<SimilarDay>,

    /// Up to 5 most recent turns, newest first; empty without a session.
    pub history: Vec<ConversationTurn>,

    /// Trend intent: trailing 30 days.
    pub trend_data: Vec<DailyMetric>,

    /// Comparison intent: weekday rows from the trailing 30 days.
    pub weekday_data: Vec<DailyMetric>,

    /// Comparison intent: weekend rows from the trailing 30 days.
    pub weekend_data: Vec<DailyMetric>,

    /// Prediction intent: trailing 14 days.
    pub recent_history: Vec<DailyMetric>,
}

impl ContextBundle {
    /// Render the bundle as compact text for appending to a user message.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if !self.relevant_data.is_empty() {
            out.push_str("Recent data:\n");
            for m in &self.relevant_data {
                out.push_str(&render_metric_line(m));
            }
        }

        if !self.trend_data.is_empty() {
            out.push_str("30-day trend data:\n");
            for m in &self.trend_data {
                out.push_str(&render_metric_line(m));
            }
        }

        if !self.weekday_data.is_empty() || !self.weekend_data.is_empty() {
            out.push_str(&format!(
                "Weekday rows: {}, weekend rows: {} (30-day window)\n",
                self.weekday_data.len(),
                self.weekend_data.len()
            ));
            if let Some(avg) = avg_systolic(&self.weekday_data) {
                out.push_str(&format!("Weekday avg systolic: {avg:.1} mmHg\n"));
            }
            if let Some(avg) = avg_systolic(&self.weekend_data) {
                out.push_str(&format!("Weekend avg systolic: {avg:.1} mmHg\n"));
            }
        }

        if !self.recent_history.is_empty() {
            out.push_str("14-day history:\n");
            for m in &self.recent_history {
                out.push_str(&render_metric_line(m));
            }
        }

        if !self.similar_days.is_empty() {
            out.push_str("Similar past days:\n");
            for day in &self.similar_days {
                out.push_str("- ");
                out.push_str(&day.summary);
                out.push('\n');
            }
        }

        out
    }
}

fn render_metric_line(m: &DailyMetric) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let (Some(sys), Some(dia)) = (m.systolic_mean, m.diastolic_mean) {
        parts.push(format!("BP {sys:.0}/{dia:.0}"));
    } else if let Some(sys) = m.systolic_mean {
        parts.push(format!("BP {sys:.0}/--"));
    }
    if let Some(sleep) = m.sleep_hours {
        parts.push(format!("sleep {sleep:.1}h"));
    }
    if let Some(steps) = m.steps {
        parts.push(format!("{steps} steps"));
    }
    if let Some(vo2) = m.vo2_max {
        parts.push(format!("VO2 {vo2:.1}"));
    }
    if parts.is_empty() {
        format!("- {}: no measurements\n", m.date)
    } else {
        format!("- {}: {}\n", m.date, parts.join(", "))
    }
}

fn avg_systolic(rows: &[DailyMetric]) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|m| m.systolic_mean).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Retrieves context from the structured store and the semantic index.
pub struct ContextRetriever {
    store: Arc<dyn HealthStore>,
    index: Arc<dyn SemanticIndex>,
    profile: UserProfile,
}

impl ContextRetriever {
    pub fn new(
        store: Arc<dyn HealthStore>,
        index: Arc<dyn SemanticIndex>,
        profile: UserProfile,
    ) -> Self {
        Self {
            store,
            index,
            profile,
        }
    }

    /// Retrieve the full bundle for one query.
    pub async fn retrieve(
        &self,
        query: &str,
        intent: &ClassifiedIntent,
        session_id: Option<&SessionId>,
        today: NaiveDate,
    ) -> Result<ContextBundle, StoreError> {
        let baselines = self.store.get_baselines().await?;

        let relevant_data = match intent.date_scope {
            Some(scope) => self.store.get_metrics(scope.start, scope.end).await?,
            None => {
                self.store
                    .get_metrics(today - Duration::days(7), today)
                    .await?
            }
        };

        let similar_days = self.index.query_similar(query, 3).await?;

        let history = match session_id {
            Some(id) => self.store.recent_turns(id, 5).await?,
            None => Vec::new(),
        };

        let mut bundle = ContextBundle {
            profile: self.profile.clone(),
            baselines,
            relevant_data,
            similar_days,
            history,
            trend_data: Vec::new(),
            weekday_data: Vec::new(),
            weekend_data: Vec::new(),
            recent_history: Vec::new(),
        };

        match intent.kind {
            IntentKind::Trend => {
                bundle.trend_data = self
                    .store
                    .get_metrics(today - Duration::days(30), today)
                    .await?;
            }
            IntentKind::Comparison => {
                let window = self
                    .store
                    .get_metrics(today - Duration::days(30), today)
                    .await?;
                let (weekday, weekend): (Vec<_>, Vec<_>) =
                    window.into_iter().partition(|m| m.is_weekday());
                bundle.weekday_data = weekday;
                bundle.weekend_data = weekend;
            }
            IntentKind::Prediction => {
                bundle.recent_history = self
                    .store
                    .get_metrics(today - Duration::days(14), today)
                    .await?;
            }
            _ => {}
        }

        debug!(
            intent = %intent.kind,
            rows = bundle.relevant_data.len(),
            similar = bundle.similar_days.len(),
            turns = bundle.history.len(),
            "Context retrieved"
        );

        Ok(bundle)
    }
}
