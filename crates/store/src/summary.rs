//! Natural-language daily summaries for the semantic index.
//!
//! Each day with data gets a one-line sentence naming the key measurements
//! with categorical labels, so FTS queries like "poor sleep" or "stage 1
//! hypertension" land on the right days.

use vitacoach_core::DailyMetric;

/// Categorize a systolic reading per the standard BP bands.
pub fn bp_category(systolic: f64) -> &'static str {
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

/// Categorize a night's sleep duration.
pub fn sleep_category(hours: f64) -> &'static str {
    if hours >= 7.0 {
        "good"
    } else if hours >= 6.0 {
        "fair"
    } else {
        "poor"
    }
}

/// Build the one-line summary for a day. Absent measurements are skipped.
pub fn create_daily_summary(metric: &DailyMetric) -> String {
    let mut parts: Vec<String> = Vec::new();

    match (metric.systolic_mean, metric.diastolic_mean) {
        (Some(sys), Some(dia)) => {
            parts.push(format!(
                "BP {sys:.0}/{dia:.0} mmHg ({})",
                bp_category(sys)
            ));
        }
        (Some(sys), None) => {
            parts.push(format!("BP {sys:.0} mmHg ({})", bp_category(sys)));
        }
        _ => {}
    }

    if let Some(hours) = metric.sleep_hours {
        parts.push(format!("slept {hours:.1}h ({})", sleep_category(hours)));
    }

    if let Some(steps) = metric.steps {
        parts.push(format!("{steps} steps"));
    }

    if let Some(vo2) = metric.vo2_max {
        parts.push(format!("VO2 max {vo2:.1}"));
    }

    if let Some(hrv) = metric.hrv_mean {
        parts.push(format!("HRV {hrv:.0} ms"));
    }

    if parts.is_empty() {
        format!("{}: no measurements recorded.", metric.date)
    } else {
        format!("{}: {}.", metric.date, parts.join(", "))
    }
}

/// Structured metadata stored alongside the summary text.
pub fn summary_metadata(metric: &DailyMetric) -> serde_json::Value {
    serde_json::json!({
        "date": metric.date.to_string(),
        "systolic": metric.systolic_mean,
        "diastolic": metric.diastolic_mean,
        "sleep_hours": metric.sleep_hours,
        "steps": metric.steps,
        "vo2_max": metric.vo2_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bp_bands() {
        assert_eq!(bp_category(118.0), "normal");
        assert_eq!(bp_category(124.0), "elevated");
        assert_eq!(bp_category(134.0), "stage 1 hypertension");
        assert_eq!(bp_category(145.0), "stage 2 hypertension");
    }

    #[test]
    fn sleep_bands() {
        assert_eq!(sleep_category(7.5), "good");
        assert_eq!(sleep_category(6.2), "fair");
        assert_eq!(sleep_category(5.4), "poor");
    }

    #[test]
    fn full_summary_line() {
        let mut m = DailyMetric::empty(day(2025, 6, 1));
        m.systolic_mean = Some(134.2);
        m.diastolic_mean = Some(84.0);
        m.sleep_hours = Some(6.2);
        m.steps = Some(8500);
        m.vo2_max = Some(37.5);

        let s = create_daily_summary(&m);
        assert_eq!(
            s,
            "2025-06-01: BP 134/84 mmHg (stage 1 hypertension), slept 6.2h (fair), \
             8500 steps, VO2 max 37.5."
        );
    }

    #[test]
    fn partial_summary_skips_absent_fields() {
        let mut m = DailyMetric::empty(day(2025, 6, 2));
        m.sleep_hours = Some(5.1);

        let s = create_daily_summary(&m);
        assert_eq!(s, "2025-06-02: slept 5.1h (poor).");
        assert!(!s.contains("BP"));
    }

    #[test]
    fn empty_day_summary() {
        let m = DailyMetric::empty(day(2025, 6, 3));
        assert_eq!(
            create_daily_summary(&m),
            "2025-06-03: no measurements recorded."
        );
    }

    #[test]
    fn metadata_carries_date_and_values() {
        let mut m = DailyMetric::empty(day(2025, 6, 1));
        m.systolic_mean = Some(134.0);
        let meta = summary_metadata(&m);
        assert_eq!(meta["date"], "2025-06-01");
        assert_eq!(meta["systolic"], 134.0);
        assert!(meta["steps"].is_null());
    }
}
