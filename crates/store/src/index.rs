//! FTS5-backed semantic index over daily summaries.
//!
//! Each day with data gets one natural-language summary row; an FTS5 virtual
//! table over the summary text answers "days like this" queries with BM25
//! ranking. Triggers keep the FTS index in sync on insert/delete/update.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use vitacoach_core::error::StoreError;
use vitacoach_core::store::{SemanticIndex, SimilarDay};
use vitacoach_core::DailyMetric;

use crate::summary::{create_daily_summary, summary_metadata};

/// The production summary index.
pub struct SummaryIndex {
    pool: SqlitePool,
}

impl SummaryIndex {
    /// Open (or create) the index at a file path.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Index(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Index(format!("Failed to open SQLite: {e}")))?;

        let index = Self { pool };
        index.run_migrations().await?;
        info!("Summary index initialized at {path}");
        Ok(index)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let index = Self { pool };
        index.run_migrations().await?;
        Ok(index)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        // Integer rowid alias for FTS5 sync; date stays unique so upserts
        // replace rather than accumulate
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_summaries (
                iid      INTEGER PRIMARY KEY AUTOINCREMENT,
                date     TEXT UNIQUE NOT NULL,
                summary  TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("daily_summaries table: {e}")))?;

        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS summaries_fts USING fts5(
                summary,
                content='daily_summaries',
                content_rowid='iid',
                tokenize='porter unicode61'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("FTS5 table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS summaries_ai AFTER INSERT ON daily_summaries BEGIN
                INSERT INTO summaries_fts(rowid, summary)
                VALUES (new.iid, new.summary);
            END
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("insert trigger: {e}")))?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS summaries_ad AFTER DELETE ON daily_summaries BEGIN
                INSERT INTO summaries_fts(summaries_fts, rowid, summary)
                VALUES ('delete', old.iid, old.summary);
            END
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("delete trigger: {e}")))?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS summaries_au AFTER UPDATE ON daily_summaries BEGIN
                INSERT INTO summaries_fts(summaries_fts, rowid, summary)
                VALUES ('delete', old.iid, old.summary);
                INSERT INTO summaries_fts(rowid, summary)
                VALUES (new.iid, new.summary);
            END
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("update trigger: {e}")))?;

        debug!("Summary index migrations complete");
        Ok(())
    }

    /// Build a safe FTS5 query from user text.
    ///
    /// Tokens are stripped to alphanumerics, quoted, and prefix-matched;
    /// joined with OR so a query only needs to share some vocabulary with a
    /// summary to rank it.
    fn sanitize_fts_query(text: &str) -> String {
        text.split_whitespace()
            .map(|w| {
                let clean: String = w
                    .chars()
                    .filter(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if clean.is_empty() {
                    return String::new();
                }
                format!("\"{clean}\"*")
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

#[async_trait]
impl SemanticIndex for SummaryIndex {
    async fn upsert_summary(
        &self,
        date: NaiveDate,
        metric: &DailyMetric,
    ) -> Result<(), StoreError> {
        let summary = create_daily_summary(metric);
        let metadata = serde_json::to_string(&summary_metadata(metric))
            .map_err(|e| StoreError::Index(format!("metadata serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO daily_summaries (date, summary, metadata)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(date) DO UPDATE SET
                summary = excluded.summary,
                metadata = excluded.metadata
            "#,
        )
        .bind(date.to_string())
        .bind(&summary)
        .bind(&metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Index(format!("summary upsert: {e}")))?;

        debug!("Indexed summary for {date}");
        Ok(())
    }

    async fn query_similar(&self, text: &str, k: usize) -> Result<Vec<SimilarDay>, StoreError> {
        let fts_query = Self::sanitize_fts_query(text);
        if fts_query.is_empty() {
            return Ok(vec![]);
        }

        // bm25() is negative, lower = better match; ascending order puts the
        // nearest summaries first
        let rows = sqlx::query(
            r#"
            SELECT s.summary, s.metadata, bm25(summaries_fts) AS distance
            FROM summaries_fts f
            JOIN daily_summaries s ON s.iid = f.rowid
            WHERE summaries_fts MATCH ?1
            ORDER BY distance
            LIMIT ?2
            "#,
        )
        .bind(&fts_query)
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Index(format!("FTS5 query: {e}")))?;

        rows.iter()
            .map(|row| {
                let summary: String = row
                    .try_get("summary")
                    .map_err(|e| StoreError::Index(format!("summary column: {e}")))?;
                let metadata_str: String =
                    row.try_get("metadata").unwrap_or_else(|_| "{}".into());
                let distance: f64 = row.try_get("distance").unwrap_or(0.0);

                Ok(SimilarDay {
                    summary,
                    metadata: serde_json::from_str(&metadata_str)
                        .unwrap_or(serde_json::Value::Null),
                    distance,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_index() -> SummaryIndex {
        SummaryIndex::new("sqlite::memory:").await.unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn metric(date: NaiveDate, systolic: f64, sleep: f64) -> DailyMetric {
        let mut m = DailyMetric::empty(date);
        m.systolic_mean = Some(systolic);
        m.diastolic_mean = Some(systolic * 0.65);
        m.sleep_hours = Some(sleep);
        m
    }

    #[tokio::test]
    async fn upsert_and_query() {
        let index = test_index().await;
        index
            .upsert_summary(day(2025, 6, 1), &metric(day(2025, 6, 1), 145.0, 5.2))
            .await
            .unwrap();
        index
            .upsert_summary(day(2025, 6, 2), &metric(day(2025, 6, 2), 118.0, 7.8))
            .await
            .unwrap();

        let results = index.query_similar("poor sleep", 3).await.unwrap();
        assert!(!results.is_empty());
        assert!(results[0].summary.contains("poor"));
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_date() {
        let index = test_index().await;
        let date = day(2025, 6, 1);
        index
            .upsert_summary(date, &metric(date, 145.0, 5.2))
            .await
            .unwrap();
        index
            .upsert_summary(date, &metric(date, 122.0, 7.5))
            .await
            .unwrap();

        // The replaced summary must not be findable anymore
        let stale = index.query_similar("stage 2 hypertension", 5).await.unwrap();
        assert!(stale.is_empty());

        let fresh = index.query_similar("elevated", 5).await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].metadata["date"], "2025-06-01");
    }

    #[tokio::test]
    async fn nearest_first_ordering() {
        let index = test_index().await;
        index
            .upsert_summary(day(2025, 6, 1), &metric(day(2025, 6, 1), 145.0, 5.0))
            .await
            .unwrap();
        index
            .upsert_summary(day(2025, 6, 2), &metric(day(2025, 6, 2), 145.0, 7.5))
            .await
            .unwrap();

        // Both days mention hypertension; only June 1 also matches "poor"
        let results = index
            .query_similar("poor sleep hypertension", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].distance <= results[1].distance);
        assert!(results[0].summary.contains("poor"));
    }

    #[tokio::test]
    async fn respects_k() {
        let index = test_index().await;
        for d in 1..=10 {
            index
                .upsert_summary(day(2025, 6, d), &metric(day(2025, 6, d), 135.0, 6.5))
                .await
                .unwrap();
        }

        let results = index.query_similar("hypertension", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn empty_query_returns_nothing() {
        let index = test_index().await;
        index
            .upsert_summary(day(2025, 6, 1), &metric(day(2025, 6, 1), 135.0, 6.5))
            .await
            .unwrap();

        assert!(index.query_similar("", 5).await.unwrap().is_empty());
        assert!(index.query_similar("!!!", 5).await.unwrap().is_empty());
    }

    #[test]
    fn sanitize_quotes_and_prefixes() {
        assert_eq!(
            SummaryIndex::sanitize_fts_query("poor sleep?"),
            "\"poor\"* OR \"sleep\"*"
        );
        assert_eq!(SummaryIndex::sanitize_fts_query("   "), "");
    }
}
