//! `vitacoach record` — Enter a day's measurements by hand.
//!
//! Updates the structured row and refreshes the day's summary in the
//! semantic index so retrieval sees the new data immediately.

use chrono::{Local, NaiveDate};
use vitacoach_config::AppConfig;
use vitacoach_core::{DailyMetric, HealthStore, SemanticIndex};

pub struct Measurements {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub sleep: Option<f64>,
    pub efficiency: Option<f64>,
    pub steps: Option<i64>,
    pub vo2: Option<f64>,
    pub hrv: Option<f64>,
}

impl Measurements {
    fn is_empty(&self) -> bool {
        self.systolic.is_none()
            && self.diastolic.is_none()
            && self.sleep.is_none()
            && self.efficiency.is_none()
            && self.steps.is_none()
            && self.vo2.is_none()
            && self.hrv.is_none()
    }
}

pub async fn run(
    date: Option<&str>,
    measurements: Measurements,
) -> Result<(), Box<dyn std::error::Error>> {
    if measurements.is_empty() {
        return Err(
            "No measurements given. Try e.g. `vitacoach record --systolic 134 --sleep 7.2`".into(),
        );
    }

    let target = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))?,
        None => Local::now().date_naive(),
    };

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = super::open_store(&config).await?;
    let index = super::open_index(&config).await?;

    // Merge into any existing row so partial entries accumulate
    let mut metric = store
        .get_metric(target)
        .await?
        .unwrap_or_else(|| DailyMetric::empty(target));

    if measurements.systolic.is_some() {
        metric.systolic_mean = measurements.systolic;
    }
    if measurements.diastolic.is_some() {
        metric.diastolic_mean = measurements.diastolic;
    }
    if measurements.sleep.is_some() {
        metric.sleep_hours = measurements.sleep;
    }
    if measurements.efficiency.is_some() {
        metric.sleep_efficiency_pct = measurements.efficiency;
    }
    if measurements.steps.is_some() {
        metric.steps = measurements.steps;
    }
    if measurements.vo2.is_some() {
        metric.vo2_max = measurements.vo2;
    }
    if measurements.hrv.is_some() {
        metric.hrv_mean = measurements.hrv;
    }

    store.upsert_metric(&metric).await?;
    index.upsert_summary(target, &metric).await?;

    println!("  ✅ Recorded measurements for {target}");
    Ok(())
}
