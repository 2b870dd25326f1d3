//! Shared in-memory test doubles for the engine crate.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

use vitacoach_core::error::{BackendError, StoreError};
use vitacoach_core::store::NewTurn;
use vitacoach_core::{
    BackendKind, Baselines, ConversationTurn, DailyMetric, GenerationRequest, GenerationResponse,
    HealthAlert, HealthStore, ModelBackend, SemanticIndex, SessionId, SimilarDay,
};

/// In-memory `HealthStore` with the same ordering contracts as the SQLite
/// implementation.
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    metrics: BTreeMap<NaiveDate, DailyMetric>,
    turns: Vec<ConversationTurn>,
    alerts: Vec<HealthAlert>,
}

impl MemoryStore {
    pub fn put_metric(&self, metric: DailyMetric) {
        self.inner
            .lock()
            .unwrap()
            .metrics
            .insert(metric.date, metric);
    }
}

fn avg(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn get_metric(&self, date: NaiveDate) -> Result<Option<DailyMetric>, StoreError> {
        Ok(self.inner.lock().unwrap().metrics.get(&date).cloned())
    }

    async fn get_metrics(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyMetric>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .metrics
            .range(start..=end)
            .rev()
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn get_baselines(&self) -> Result<Baselines, StoreError> {
        let inner = self.inner.lock().unwrap();
        let rows: Vec<&DailyMetric> = inner.metrics.values().collect();
        Ok(Baselines {
            avg_systolic: avg(rows.iter().filter_map(|m| m.systolic_mean)),
            avg_diastolic: avg(rows.iter().filter_map(|m| m.diastolic_mean)),
            avg_sleep: avg(rows.iter().filter_map(|m| m.sleep_hours)),
            avg_steps: avg(rows.iter().filter_map(|m| m.steps.map(|s| s as f64))),
            avg_vo2_max: avg(rows.iter().filter_map(|m| m.vo2_max)),
            avg_hrv: avg(rows.iter().filter_map(|m| m.hrv_mean)),
        })
    }

    async fn append_turn(&self, turn: NewTurn<'_>) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.turns.len() as i64 + 1;
        inner.turns.push(ConversationTurn {
            id,
            session_id: turn.session_id.clone(),
            timestamp: Utc::now(),
            user_query: turn.user_query.to_string(),
            assistant_response: turn.assistant_response.to_string(),
            model: turn.model.to_string(),
            tokens_used: turn.tokens_used,
            cost_usd: turn.cost_usd,
            intent: turn.intent.to_string(),
            confidence: turn.confidence,
        });
        Ok(id)
    }

    async fn recent_turns(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .turns
            .iter()
            .rev()
            .filter(|t| &t.session_id == session_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn append_alert(&self, alert: &HealthAlert) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.alerts.len() as i64 + 1;
        let mut stored = alert.clone();
        stored.id = id;
        inner.alerts.push(stored);
        Ok(id)
    }

    async fn unacknowledged_alerts(&self, limit: u32) -> Result<Vec<HealthAlert>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<HealthAlert> = inner
            .alerts
            .iter()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect();
        let order = |a: &HealthAlert| match a.priority.as_str() {
            "critical" => 0,
            "warning" => 1,
            "info" => 2,
            _ => 3,
        };
        pending.sort_by(|a, b| order(a).cmp(&order(b)).then(b.created_at.cmp(&a.created_at)));
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn acknowledge_alert(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) if !alert.acknowledged => {
                alert.acknowledged = true;
                Ok(true)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }
}

/// In-memory `SemanticIndex`; seeded neighbours come back in insertion order.
#[derive(Default)]
pub(crate) struct MemoryIndex {
    neighbours: Mutex<Vec<SimilarDay>>,
    upserts: Mutex<Vec<NaiveDate>>,
}

impl MemoryIndex {
    #[allow(dead_code)]
    pub fn push_similar(&self, day: SimilarDay) {
        self.neighbours.lock().unwrap().push(day);
    }

    #[allow(dead_code)]
    pub fn upserted_dates(&self) -> Vec<NaiveDate> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SemanticIndex for MemoryIndex {
    async fn upsert_summary(
        &self,
        date: NaiveDate,
        _metric: &DailyMetric,
    ) -> Result<(), StoreError> {
        self.upserts.lock().unwrap().push(date);
        Ok(())
    }

    async fn query_similar(&self, _text: &str, k: usize) -> Result<Vec<SimilarDay>, StoreError> {
        let neighbours = self.neighbours.lock().unwrap();
        Ok(neighbours.iter().take(k).cloned().collect())
    }
}

/// Scripted `ModelBackend` that records every request it sees.
pub(crate) struct MockBackend {
    name: String,
    kind: BackendKind,
    available: bool,
    fail: bool,
    reply: String,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockBackend {
    pub fn new(name: &str, kind: BackendKind, available: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            available,
            fail: false,
            reply: "mock response".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Make every generate call fail with an API error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    #[allow(dead_code)]
    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        if self.fail {
            return Err(BackendError::ApiError {
                status_code: 500,
                message: "scripted failure".into(),
            });
        }
        self.requests.lock().unwrap().push(request);
        Ok(GenerationResponse {
            text: self.reply.clone(),
            model: self.name.clone(),
            input_tokens: 100,
            output_tokens: 20,
        })
    }

    async fn is_available(&self) -> bool {
        self.available
    }
}
