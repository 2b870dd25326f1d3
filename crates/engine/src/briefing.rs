//! Morning briefing generation.
//!
//! Summarizes yesterday's metrics against the user's goals and baselines,
//! with up to three recommendations and a closing line keyed to how
//! yesterday's BP compared to the 90-day average.

use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use vitacoach_core::error::StoreError;
use vitacoach_core::{Baselines, DailyMetric, HealthStore, UserProfile};

use crate::util::group_thousands;

/// Baseline fallback when the store has no systolic average.
const FALLBACK_AVG_SYSTOLIC: f64 = 142.0;

fn bp_category(systolic: f64) -> &'static str {
    if systolic < 120.0 {
        "normal"
    } else if systolic < 130.0 {
        "elevated"
    } else if systolic < 140.0 {
        "stage 1 hypertension"
    } else {
        "stage 2 hypertension"
    }
}

fn sleep_quality(hours: f64) -> &'static str {
    if hours >= 7.0 {
        "good"
    } else if hours >= 6.0 {
        "fair"
    } else {
        "poor"
    }
}

fn activity_level(steps: i64) -> &'static str {
    if steps >= 10_000 {
        "active"
    } else if steps >= 5_000 {
        "moderate"
    } else {
        "low"
    }
}

/// Generates the morning briefing for a given date.
pub struct BriefingGenerator {
    store: Arc<dyn HealthStore>,
    profile: UserProfile,
}

impl BriefingGenerator {
    pub fn new(store: Arc<dyn HealthStore>, profile: UserProfile) -> Self {
        Self { store, profile }
    }

    /// Build the briefing text for `target_date` (covering the day before).
    pub async fn generate(&self, target_date: NaiveDate) -> Result<String, StoreError> {
        let yesterday = target_date - Duration::days(1);
        let data = self.store.get_metric(yesterday).await?;
        let baselines = self.store.get_baselines().await?;

        let date_str = target_date.format("%A, %B %d, %Y");

        let Some(data) = data else {
            return Ok(format!(
                "MORNING BRIEFING: {date_str}\n\n\
                 No data available for yesterday. Please ensure your health data is synced.\n"
            ));
        };

        let bp_display = match (data.systolic_mean, data.diastolic_mean) {
            (Some(sys), Some(dia)) => format!("{sys:.0}/{dia:.0}"),
            (Some(sys), None) => format!("{sys:.0}/--"),
            _ => "N/A".to_string(),
        };
        let bp_cat = data.systolic_mean.map_or("unknown", bp_category);

        let sleep = data.sleep_hours.unwrap_or(0.0);
        let sleep_eff = data.sleep_efficiency_pct.unwrap_or(0.0);
        let steps = data.steps.unwrap_or(0);

        let mut briefing = format!(
            "MORNING BRIEFING: {date_str}\n\n\
             YESTERDAY'S SUMMARY:\n\
             - BP: {bp_display} mmHg ({bp_cat})\n\
             - Sleep: {sleep:.1}hrs ({sleep_eff:.0}% efficiency) - {quality}\n\
             - Activity: {steps} steps - {level}\n\n\
             RECOMMENDATIONS:\n",
            quality = sleep_quality(sleep),
            level = activity_level(steps),
            steps = group_thousands(steps),
        );

        for (i, rec) in self.recommendations(&data).iter().take(3).enumerate() {
            briefing.push_str(&format!("{}. {rec}\n", i + 1));
        }

        briefing.push('\n');
        briefing.push_str(motivational_message(&data, &baselines));

        Ok(briefing)
    }

    fn recommendations(&self, yesterday: &DailyMetric) -> Vec<String> {
        let mut recs = Vec::new();

        let sleep = yesterday.sleep_hours.unwrap_or(0.0);
        let steps = yesterday.steps.unwrap_or(0);

        if sleep < 7.0 {
            recs.push(format!(
                "Prioritize sleep tonight - aim for 7+ hours (you got {sleep:.1}hrs)"
            ));
        }

        if steps < 10_000 {
            let gap = 10_000 - steps;
            recs.push(format!(
                "Add {} more steps today to hit your goal",
                group_thousands(gap)
            ));
        }

        if let Some(vo2) = yesterday.vo2_max {
            if vo2 < self.profile.vo2_max_goal {
                recs.push(
                    "Include cardio exercise to improve VO2 Max - your strongest BP factor"
                        .to_string(),
                );
            }
        }

        if recs.is_empty() {
            recs.push("Maintain your current healthy habits!".to_string());
        }

        recs
    }
}

fn motivational_message(yesterday: &DailyMetric, baselines: &Baselines) -> &'static str {
    // A missing reading must not look like a great day
    let systolic = yesterday.systolic_mean.unwrap_or(999.0);
    let avg = baselines.avg_systolic.unwrap_or(FALLBACK_AVG_SYSTOLIC);

    if systolic < avg - 5.0 {
        "Great job! Your BP was below your average yesterday. Keep up the good work!"
    } else if systolic > avg + 5.0 {
        "Yesterday was a tougher day for BP. Today is a fresh start!"
    } else {
        "Consistency is key. Every healthy choice adds up over time."
    }
}
