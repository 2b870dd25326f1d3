//! Daily biometric domain types.
//!
//! A `DailyMetric` is one row per calendar date. Every measurement field is
//! optional: imports are sparse, and an absent value must stay absent — it is
//! never coerced to zero in averages or trend math.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of biometric data, keyed by calendar date.
///
/// The date is immutable once the row exists; import/sync processes may fill
/// in measurement fields, but the core only ever reads these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    /// The calendar date this row describes (unique key).
    pub date: NaiveDate,

    /// Mean systolic blood pressure (mmHg).
    pub systolic_mean: Option<f64>,

    /// Mean diastolic blood pressure (mmHg).
    pub diastolic_mean: Option<f64>,

    /// Mean heart rate (bpm).
    pub heart_rate_mean: Option<f64>,

    /// Total step count.
    pub steps: Option<i64>,

    /// Sleep duration in hours.
    pub sleep_hours: Option<f64>,

    /// Sleep efficiency as a percentage.
    pub sleep_efficiency_pct: Option<f64>,

    /// Estimated VO2 max.
    pub vo2_max: Option<f64>,

    /// Composite stress score.
    pub stress_score: Option<f64>,

    /// Mean heart-rate variability (ms).
    pub hrv_mean: Option<f64>,

    /// Respiratory rate (breaths/min).
    pub respiratory_rate: Option<f64>,

    /// Active calories burned.
    pub active_calories: Option<f64>,

    /// Minutes of recorded exercise.
    pub exercise_minutes: Option<i64>,
}

impl DailyMetric {
    /// An empty row for the given date, all measurements absent.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            systolic_mean: None,
            diastolic_mean: None,
            heart_rate_mean: None,
            steps: None,
            sleep_hours: None,
            sleep_efficiency_pct: None,
            vo2_max: None,
            stress_score: None,
            hrv_mean: None,
            respiratory_rate: None,
            active_calories: None,
            exercise_minutes: None,
        }
    }

    /// Whether the day falls on a weekday (Mon–Fri) by its own date field.
    pub fn is_weekday(&self) -> bool {
        use chrono::Datelike;
        self.date.weekday().num_days_from_monday() < 5
    }
}

/// Trailing 90-day averages, computed on demand from `DailyMetric` rows.
///
/// A field is `None` when no contributing data exists in the window. Callers
/// that need a number for display or arithmetic choose their own fallback;
/// the store never substitutes one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    pub avg_systolic: Option<f64>,
    pub avg_diastolic: Option<f64>,
    pub avg_sleep: Option<f64>,
    pub avg_steps: Option<f64>,
    pub avg_vo2_max: Option<f64>,
    pub avg_hrv: Option<f64>,
}

impl Baselines {
    /// Whether every baseline is absent (empty store window).
    pub fn is_empty(&self) -> bool {
        self.avg_systolic.is_none()
            && self.avg_diastolic.is_none()
            && self.avg_sleep.is_none()
            && self.avg_steps.is_none()
            && self.avg_vo2_max.is_none()
            && self.avg_hrv.is_none()
    }
}

/// The user's health profile and goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name used in prompts and briefings.
    pub name: String,

    /// Target systolic blood pressure (mmHg, "stay under").
    pub bp_goal: f64,

    /// Target nightly sleep (hours).
    pub sleep_goal: f64,

    /// Target daily step count.
    pub steps_goal: i64,

    /// Target VO2 max.
    pub vo2_max_goal: f64,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "the user".into(),
            bp_goal: 130.0,
            sleep_goal: 7.0,
            steps_goal: 10_000,
            vo2_max_goal: 43.0,
        }
    }
}
