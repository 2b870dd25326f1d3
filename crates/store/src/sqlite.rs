//! SQLite structured store: daily metrics, conversation log, alerts.
//!
//! One database file, three tables:
//! - `daily_health_data` — one row per calendar date, measurement columns
//!   nullable so sparse imports stay sparse
//! - `conversations` — append-only turn log
//! - `alerts` — detected health alerts with acknowledgement state

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use vitacoach_core::error::StoreError;
use vitacoach_core::store::{AlertKind, AlertPriority, HealthAlert, HealthStore, NewTurn};
use vitacoach_core::{Baselines, ConversationTurn, DailyMetric, SessionId};

/// The production SQLite store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the store at a file path.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database
    /// (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite health store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_health_data (
                date                TEXT PRIMARY KEY,
                systolic_mean       REAL,
                diastolic_mean      REAL,
                heart_rate_mean     REAL,
                steps               INTEGER,
                sleep_hours         REAL,
                sleep_efficiency_pct REAL,
                vo2_max             REAL,
                stress_score        REAL,
                hrv_mean            REAL,
                respiratory_rate    REAL,
                active_calories     REAL,
                exercise_minutes    INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("daily_health_data table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id         TEXT NOT NULL,
                timestamp          TEXT NOT NULL,
                user_query         TEXT NOT NULL,
                assistant_response TEXT NOT NULL,
                model              TEXT NOT NULL,
                tokens_used        INTEGER NOT NULL DEFAULT 0,
                cost_usd           REAL NOT NULL DEFAULT 0.0,
                intent             TEXT NOT NULL,
                confidence         REAL NOT NULL DEFAULT 0.0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("conversations table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_session
             ON conversations(session_id, timestamp DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("conversations index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                kind         TEXT NOT NULL,
                priority     TEXT NOT NULL,
                title        TEXT NOT NULL,
                message      TEXT NOT NULL,
                data         TEXT NOT NULL DEFAULT '{}',
                created_at   TEXT NOT NULL,
                acknowledged INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("alerts table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Most recent turns across all sessions, newest first.
    pub async fn latest_turns(&self, limit: u32) -> Result<Vec<ConversationTurn>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("latest turns: {e}")))?;

        rows.iter().map(Self::row_to_turn).collect()
    }

    /// Insert or overwrite the row for a date. Used by importers and tests.
    pub async fn upsert_metric(&self, metric: &DailyMetric) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO daily_health_data (
                date, systolic_mean, diastolic_mean, heart_rate_mean, steps,
                sleep_hours, sleep_efficiency_pct, vo2_max, stress_score,
                hrv_mean, respiratory_rate, active_calories, exercise_minutes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(date) DO UPDATE SET
                systolic_mean = excluded.systolic_mean,
                diastolic_mean = excluded.diastolic_mean,
                heart_rate_mean = excluded.heart_rate_mean,
                steps = excluded.steps,
                sleep_hours = excluded.sleep_hours,
                sleep_efficiency_pct = excluded.sleep_efficiency_pct,
                vo2_max = excluded.vo2_max,
                stress_score = excluded.stress_score,
                hrv_mean = excluded.hrv_mean,
                respiratory_rate = excluded.respiratory_rate,
                active_calories = excluded.active_calories,
                exercise_minutes = excluded.exercise_minutes
            "#,
        )
        .bind(metric.date.to_string())
        .bind(metric.systolic_mean)
        .bind(metric.diastolic_mean)
        .bind(metric.heart_rate_mean)
        .bind(metric.steps)
        .bind(metric.sleep_hours)
        .bind(metric.sleep_efficiency_pct)
        .bind(metric.vo2_max)
        .bind(metric.stress_score)
        .bind(metric.hrv_mean)
        .bind(metric.respiratory_rate)
        .bind(metric.active_calories)
        .bind(metric.exercise_minutes)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("metric upsert: {e}")))?;

        Ok(())
    }

    fn row_to_metric(row: &sqlx::sqlite::SqliteRow) -> Result<DailyMetric, StoreError> {
        let date_str: String = row
            .try_get("date")
            .map_err(|e| StoreError::QueryFailed(format!("date column: {e}")))?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| StoreError::QueryFailed(format!("date parse '{date_str}': {e}")))?;

        Ok(DailyMetric {
            date,
            systolic_mean: row.try_get("systolic_mean").unwrap_or(None),
            diastolic_mean: row.try_get("diastolic_mean").unwrap_or(None),
            heart_rate_mean: row.try_get("heart_rate_mean").unwrap_or(None),
            steps: row.try_get("steps").unwrap_or(None),
            sleep_hours: row.try_get("sleep_hours").unwrap_or(None),
            sleep_efficiency_pct: row.try_get("sleep_efficiency_pct").unwrap_or(None),
            vo2_max: row.try_get("vo2_max").unwrap_or(None),
            stress_score: row.try_get("stress_score").unwrap_or(None),
            hrv_mean: row.try_get("hrv_mean").unwrap_or(None),
            respiratory_rate: row.try_get("respiratory_rate").unwrap_or(None),
            active_calories: row.try_get("active_calories").unwrap_or(None),
            exercise_minutes: row.try_get("exercise_minutes").unwrap_or(None),
        })
    }

    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationTurn, StoreError> {
        let timestamp_str: String = row
            .try_get("timestamp")
            .map_err(|e| StoreError::QueryFailed(format!("timestamp column: {e}")))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| StoreError::QueryFailed(format!("session_id column: {e}")))?;
        let tokens_used: i64 = row.try_get("tokens_used").unwrap_or(0);

        Ok(ConversationTurn {
            id: row
                .try_get("id")
                .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?,
            session_id: SessionId(session_id),
            timestamp,
            user_query: row
                .try_get("user_query")
                .map_err(|e| StoreError::QueryFailed(format!("user_query column: {e}")))?,
            assistant_response: row
                .try_get("assistant_response")
                .map_err(|e| StoreError::QueryFailed(format!("assistant_response column: {e}")))?,
            model: row
                .try_get("model")
                .map_err(|e| StoreError::QueryFailed(format!("model column: {e}")))?,
            tokens_used: tokens_used as u32,
            cost_usd: row.try_get("cost_usd").unwrap_or(0.0),
            intent: row
                .try_get("intent")
                .map_err(|e| StoreError::QueryFailed(format!("intent column: {e}")))?,
            confidence: row.try_get("confidence").unwrap_or(0.0),
        })
    }

    fn parse_kind(s: &str) -> Result<AlertKind, StoreError> {
        match s {
            "poor_sleep_streak" => Ok(AlertKind::PoorSleepStreak),
            "bp_spike" => Ok(AlertKind::BpSpike),
            "bp_low" => Ok(AlertKind::BpLow),
            "streak_achieved" => Ok(AlertKind::StreakAchieved),
            "goal_achieved" => Ok(AlertKind::GoalAchieved),
            "trend_warning" => Ok(AlertKind::TrendWarning),
            "trend_positive" => Ok(AlertKind::TrendPositive),
            other => Err(StoreError::QueryFailed(format!("unknown alert kind '{other}'"))),
        }
    }

    fn parse_priority(s: &str) -> Result<AlertPriority, StoreError> {
        match s {
            "critical" => Ok(AlertPriority::Critical),
            "warning" => Ok(AlertPriority::Warning),
            "info" => Ok(AlertPriority::Info),
            "celebration" => Ok(AlertPriority::Celebration),
            other => Err(StoreError::QueryFailed(format!(
                "unknown alert priority '{other}'"
            ))),
        }
    }

    fn row_to_alert(row: &sqlx::sqlite::SqliteRow) -> Result<HealthAlert, StoreError> {
        let kind_str: String = row
            .try_get("kind")
            .map_err(|e| StoreError::QueryFailed(format!("kind column: {e}")))?;
        let priority_str: String = row
            .try_get("priority")
            .map_err(|e| StoreError::QueryFailed(format!("priority column: {e}")))?;
        let data_str: String = row.try_get("data").unwrap_or_else(|_| "{}".into());
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let acknowledged: i64 = row.try_get("acknowledged").unwrap_or(0);

        Ok(HealthAlert {
            id: row
                .try_get("id")
                .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?,
            kind: Self::parse_kind(&kind_str)?,
            priority: Self::parse_priority(&priority_str)?,
            title: row
                .try_get("title")
                .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?,
            message: row
                .try_get("message")
                .map_err(|e| StoreError::QueryFailed(format!("message column: {e}")))?,
            data: serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null),
            created_at,
            acknowledged: acknowledged != 0,
        })
    }
}

#[async_trait]
impl HealthStore for SqliteStore {
    async fn get_metric(&self, date: NaiveDate) -> Result<Option<DailyMetric>, StoreError> {
        let row = sqlx::query("SELECT * FROM daily_health_data WHERE date = ?1")
            .bind(date.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("metric by date: {e}")))?;

        match row {
            Some(ref r) => Ok(Some(Self::row_to_metric(r)?)),
            None => Ok(None),
        }
    }

    async fn get_metrics(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyMetric>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM daily_health_data
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date DESC",
        )
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("metric range: {e}")))?;

        rows.iter().map(Self::row_to_metric).collect()
    }

    async fn get_baselines(&self) -> Result<Baselines, StoreError> {
        // AVG ignores NULLs and returns NULL over an empty window, which
        // maps straight onto the Option fields.
        let row = sqlx::query(
            r#"
            SELECT
                AVG(systolic_mean)  AS avg_systolic,
                AVG(diastolic_mean) AS avg_diastolic,
                AVG(sleep_hours)    AS avg_sleep,
                AVG(steps)          AS avg_steps,
                AVG(vo2_max)        AS avg_vo2_max,
                AVG(hrv_mean)       AS avg_hrv
            FROM daily_health_data
            WHERE date >= date('now', '-90 days')
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("baselines: {e}")))?;

        Ok(Baselines {
            avg_systolic: row.try_get("avg_systolic").unwrap_or(None),
            avg_diastolic: row.try_get("avg_diastolic").unwrap_or(None),
            avg_sleep: row.try_get("avg_sleep").unwrap_or(None),
            avg_steps: row.try_get("avg_steps").unwrap_or(None),
            avg_vo2_max: row.try_get("avg_vo2_max").unwrap_or(None),
            avg_hrv: row.try_get("avg_hrv").unwrap_or(None),
        })
    }

    async fn append_turn(&self, turn: NewTurn<'_>) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO conversations (
                session_id, timestamp, user_query, assistant_response,
                model, tokens_used, cost_usd, intent, confidence
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&turn.session_id.0)
        .bind(Utc::now().to_rfc3339())
        .bind(turn.user_query)
        .bind(turn.assistant_response)
        .bind(turn.model)
        .bind(turn.tokens_used as i64)
        .bind(turn.cost_usd)
        .bind(turn.intent)
        .bind(turn.confidence)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("turn insert: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    async fn recent_turns(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations
             WHERE session_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )
        .bind(&session_id.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("recent turns: {e}")))?;

        rows.iter().map(Self::row_to_turn).collect()
    }

    async fn append_alert(&self, alert: &HealthAlert) -> Result<i64, StoreError> {
        let data_json = serde_json::to_string(&alert.data)
            .map_err(|e| StoreError::Storage(format!("alert data serialization: {e}")))?;

        let result = sqlx::query(
            r#"
            INSERT INTO alerts (kind, priority, title, message, data, created_at, acknowledged)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(alert.kind.as_str())
        .bind(alert.priority.as_str())
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(&data_json)
        .bind(alert.created_at.to_rfc3339())
        .bind(alert.acknowledged as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("alert insert: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    async fn unacknowledged_alerts(&self, limit: u32) -> Result<Vec<HealthAlert>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM alerts
            WHERE acknowledged = 0
            ORDER BY
                CASE priority
                    WHEN 'critical' THEN 0
                    WHEN 'warning' THEN 1
                    WHEN 'info' THEN 2
                    ELSE 3
                END,
                created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("unacknowledged alerts: {e}")))?;

        rows.iter().map(Self::row_to_alert).collect()
    }

    async fn acknowledge_alert(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE alerts SET acknowledged = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("alert ack: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
