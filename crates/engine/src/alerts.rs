//! Health alert detection.
//!
//! Five checks run against recent store data: poor-sleep streaks, BP
//! anomalies against the 14-day distribution, BP-goal streaks, activity
//! streaks, and week-over-week BP trend shifts. Every triggered alert is
//! persisted before being returned.

use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use vitacoach_core::error::StoreError;
use vitacoach_core::store::{AlertKind, AlertPriority};
use vitacoach_core::{DailyMetric, HealthAlert, HealthStore, UserProfile};

/// Baseline fallback for the sleep-streak BP projection.
const FALLBACK_AVG_SYSTOLIC: f64 = 140.0;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; `None` below two values.
fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Count consecutive rows (newest first) satisfying `pred`, stopping at the
/// first miss.
fn streak_len(rows: &[DailyMetric], pred: impl Fn(&DailyMetric) -> bool) -> usize {
    rows.iter().take_while(|m| pred(m)).count()
}

fn make_alert(
    kind: AlertKind,
    priority: AlertPriority,
    title: &str,
    message: String,
    data: serde_json::Value,
) -> HealthAlert {
    HealthAlert {
        id: 0,
        kind,
        priority,
        title: title.to_string(),
        message,
        data,
        created_at: Utc::now(),
        acknowledged: false,
    }
}

/// Detects and persists health alerts.
pub struct AlertEngine {
    store: Arc<dyn HealthStore>,
    profile: UserProfile,
}

impl AlertEngine {
    pub fn new(store: Arc<dyn HealthStore>, profile: UserProfile) -> Self {
        Self { store, profile }
    }

    /// Run every check for `check_date`; triggered alerts are persisted and
    /// returned with their store ids.
    pub async fn check_all(&self, check_date: NaiveDate) -> Result<Vec<HealthAlert>, StoreError> {
        let mut alerts = Vec::new();

        alerts.extend(self.check_sleep_streak(check_date).await?);
        alerts.extend(self.check_bp_anomaly(check_date).await?);
        alerts.extend(self.check_bp_streak(check_date).await?);
        alerts.extend(self.check_activity_streak(check_date).await?);
        alerts.extend(self.check_trend(check_date).await?);

        for alert in &mut alerts {
            alert.id = self.store.append_alert(alert).await?;
        }

        if !alerts.is_empty() {
            info!(count = alerts.len(), %check_date, "Alerts triggered");
        }

        Ok(alerts)
    }

    /// Three or more consecutive nights under 6 hours of sleep.
    async fn check_sleep_streak(
        &self,
        check_date: NaiveDate,
    ) -> Result<Option<HealthAlert>, StoreError> {
        let rows = self
            .store
            .get_metrics(check_date - Duration::days(7), check_date)
            .await?;

        let consecutive = streak_len(&rows, |m| m.sleep_hours.is_some_and(|s| s < 6.0));
        if consecutive < 3 {
            return Ok(None);
        }

        let baselines = self.store.get_baselines().await?;
        let avg_bp = baselines.avg_systolic.unwrap_or(FALLBACK_AVG_SYSTOLIC);
        let predicted_increase = consecutive as f64 * 2.0;

        Ok(Some(make_alert(
            AlertKind::PoorSleepStreak,
            AlertPriority::Warning,
            "Poor Sleep Streak",
            format!(
                "⚠️ {consecutive} consecutive nights under 6 hours of sleep. \
                 Tomorrow's BP predicted: {:.0}-{:.0} mmHg. \
                 Prioritize 7+ hours tonight.",
                avg_bp + predicted_increase,
                avg_bp + predicted_increase + 4.0
            ),
            json!({
                "consecutive_nights": consecutive,
                "predicted_bp_increase": predicted_increase,
                "recommendation": "Prioritize 7+ hours sleep tonight",
            }),
        )))
    }

    /// Today's reading more than two standard deviations off the 14-day mean.
    async fn check_bp_anomaly(
        &self,
        check_date: NaiveDate,
    ) -> Result<Option<HealthAlert>, StoreError> {
        let rows = self
            .store
            .get_metrics(check_date - Duration::days(14), check_date)
            .await?;

        let readings: Vec<(NaiveDate, f64)> = rows
            .iter()
            .filter_map(|m| m.systolic_mean.map(|s| (m.date, s)))
            .collect();
        if readings.len() < 3 {
            return Ok(None);
        }

        let Some(&(_, today_bp)) = readings.iter().find(|(d, _)| *d == check_date) else {
            return Ok(None);
        };

        let others: Vec<f64> = readings
            .iter()
            .filter(|(d, _)| *d != check_date)
            .map(|(_, v)| *v)
            .collect();
        let avg_bp = mean(&others);
        let std_bp = sample_stdev(&others).unwrap_or(5.0);

        if today_bp > avg_bp + 2.0 * std_bp && today_bp > 140.0 {
            return Ok(Some(make_alert(
                AlertKind::BpSpike,
                AlertPriority::Warning,
                "Elevated BP Detected",
                format!(
                    "🔴 Today's BP ({today_bp:.0} mmHg) is significantly above \
                     your recent average ({avg_bp:.0} mmHg). \
                     Check stress, sleep, and activity levels."
                ),
                json!({
                    "today_bp": today_bp,
                    "average_bp": avg_bp,
                    "deviation": if std_bp > 0.0 { (today_bp - avg_bp) / std_bp } else { 0.0 },
                }),
            )));
        }

        if today_bp < avg_bp - 2.0 * std_bp && today_bp < 130.0 {
            return Ok(Some(make_alert(
                AlertKind::BpLow,
                AlertPriority::Celebration,
                "Excellent BP Reading!",
                format!(
                    "🎉 Today's BP ({today_bp:.0} mmHg) is exceptionally good! \
                     That's {:.0} mmHg below your average. \
                     Note what you did differently!",
                    avg_bp - today_bp
                ),
                json!({
                    "today_bp": today_bp,
                    "average_bp": avg_bp,
                    "improvement": avg_bp - today_bp,
                }),
            )));
        }

        Ok(None)
    }

    /// Celebrates exactly 7 and exactly 14 consecutive days under the BP goal.
    async fn check_bp_streak(
        &self,
        check_date: NaiveDate,
    ) -> Result<Option<HealthAlert>, StoreError> {
        let rows = self
            .store
            .get_metrics(check_date - Duration::days(14), check_date)
            .await?;

        let goal = self.profile.bp_goal;
        let consecutive = streak_len(&rows, |m| m.systolic_mean.is_some_and(|s| s < goal));

        let alert = match consecutive {
            7 => Some(make_alert(
                AlertKind::StreakAchieved,
                AlertPriority::Celebration,
                "7-Day BP Streak!",
                format!(
                    "🎉 7 consecutive days with BP under {goal:.0} mmHg! \
                     This is your best streak in recent history. Keep it going!"
                ),
                json!({ "streak_days": consecutive, "goal": goal }),
            )),
            14 => Some(make_alert(
                AlertKind::StreakAchieved,
                AlertPriority::Celebration,
                "2-Week BP Streak!",
                format!(
                    "🏆 14 consecutive days with BP under {goal:.0} mmHg! \
                     Outstanding achievement! Your habits are clearly working."
                ),
                json!({ "streak_days": consecutive, "goal": goal }),
            )),
            _ => None,
        };

        Ok(alert)
    }

    /// Celebrates exactly 7 consecutive days of 10,000+ steps.
    async fn check_activity_streak(
        &self,
        check_date: NaiveDate,
    ) -> Result<Option<HealthAlert>, StoreError> {
        let rows = self
            .store
            .get_metrics(check_date - Duration::days(7), check_date)
            .await?;

        let consecutive = streak_len(&rows, |m| m.steps.is_some_and(|s| s >= 10_000));
        if consecutive != 7 {
            return Ok(None);
        }

        Ok(Some(make_alert(
            AlertKind::GoalAchieved,
            AlertPriority::Celebration,
            "Perfect Activity Week!",
            "🏃 7 consecutive days with 10,000+ steps! \
             This is excellent for your BP and overall health."
                .to_string(),
            json!({ "streak_days": consecutive, "goal": 10_000 }),
        )))
    }

    /// Week-over-week BP shift of 5 mmHg or more, either direction.
    async fn check_trend(&self, check_date: NaiveDate) -> Result<Option<HealthAlert>, StoreError> {
        let this_week = self
            .store
            .get_metrics(check_date - Duration::days(6), check_date)
            .await?;
        let last_week = self
            .store
            .get_metrics(check_date - Duration::days(13), check_date - Duration::days(7))
            .await?;

        let this_bp: Vec<f64> = this_week.iter().filter_map(|m| m.systolic_mean).collect();
        let last_bp: Vec<f64> = last_week.iter().filter_map(|m| m.systolic_mean).collect();

        if this_bp.len() < 3 || last_bp.len() < 3 {
            return Ok(None);
        }

        let this_avg = mean(&this_bp);
        let last_avg = mean(&last_bp);
        let change = this_avg - last_avg;

        if change >= 5.0 {
            let sleep_avg = |rows: &[DailyMetric]| {
                let hours: Vec<f64> = rows.iter().filter_map(|m| m.sleep_hours).collect();
                if hours.is_empty() { 7.0 } else { mean(&hours) }
            };
            let sleep_worse = sleep_avg(&this_week) < sleep_avg(&last_week) - 0.5;

            return Ok(Some(make_alert(
                AlertKind::TrendWarning,
                AlertPriority::Warning,
                "BP Trending Up",
                format!(
                    "📈 Your BP has increased by {change:.0} mmHg this week \
                     (from {last_avg:.0} to {this_avg:.0} mmHg). {}",
                    if sleep_worse {
                        "Sleep quality decreased - this may be a factor."
                    } else {
                        "Review stress and activity levels."
                    }
                ),
                json!({
                    "this_week_avg": this_avg,
                    "last_week_avg": last_avg,
                    "change": change,
                    "sleep_factor": sleep_worse,
                }),
            )));
        }

        if change <= -5.0 {
            return Ok(Some(make_alert(
                AlertKind::TrendPositive,
                AlertPriority::Celebration,
                "BP Trending Down!",
                format!(
                    "📉 Your BP has improved by {:.0} mmHg this week \
                     (from {last_avg:.0} to {this_avg:.0} mmHg). \
                     Your habits are paying off!",
                    change.abs()
                ),
                json!({
                    "this_week_avg": this_avg,
                    "last_week_avg": last_avg,
                    "improvement": change.abs(),
                }),
            )));
        }

        Ok(None)
    }
}
