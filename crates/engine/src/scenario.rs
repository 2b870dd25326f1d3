//! What-if scenario analysis.
//!
//! A linear model over the features that correlate with systolic BP in the
//! underlying dataset. Coefficients are per-unit systolic change; the
//! confidence band is a fixed ±5 mmHg. Diastolic moves at half the systolic
//! rate, and is estimated as 0.65 × systolic when never measured.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use vitacoach_core::error::StoreError;
use vitacoach_core::{Feasibility, HealthStore, ScenarioResult};

use crate::util::group_thousands;

/// Per-unit systolic BP change for each modifiable feature.
const COEFFICIENTS: [(&str, f64); 4] = [
    ("vo2_max", -1.96),
    ("sleep_hours", -3.1),
    ("steps", -0.0003),
    ("sleep_efficiency_pct", -0.2),
];

/// Fallbacks when the store has no baseline for a feature.
const FALLBACK_VO2_MAX: f64 = 37.0;
const FALLBACK_SLEEP_HOURS: f64 = 6.5;
const FALLBACK_STEPS: f64 = 9000.0;
const FALLBACK_SLEEP_EFFICIENCY: f64 = 80.0;
const FALLBACK_SYSTOLIC: f64 = 142.0;

/// Pure scenario math over explicit feature maps.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScenarioAnalyzer;

impl ScenarioAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Predict the BP impact of moving from `current` to `hypothetical`.
    ///
    /// Only features present in both maps contribute; an unknown key in
    /// either map is ignored rather than rejected.
    pub fn analyze(
        &self,
        current: &HashMap<String, f64>,
        hypothetical: &HashMap<String, f64>,
        current_systolic: f64,
        current_diastolic: Option<f64>,
    ) -> ScenarioResult {
        let mut systolic_delta = 0.0;
        for (feature, coefficient) in COEFFICIENTS {
            if let (Some(cur), Some(hyp)) = (current.get(feature), hypothetical.get(feature)) {
                systolic_delta += coefficient * (hyp - cur);
            }
        }

        let predicted_systolic = current_systolic + systolic_delta;
        let confidence_interval = (predicted_systolic - 5.0, predicted_systolic + 5.0);

        let vo2_delta = hypothetical.get("vo2_max").copied().unwrap_or(0.0)
            - current.get("vo2_max").copied().unwrap_or(0.0);
        let (timeline_weeks, feasibility) = if vo2_delta > 5.0 {
            (12, Feasibility::Moderate)
        } else if vo2_delta > 2.0 {
            (6, Feasibility::High)
        } else {
            (4, Feasibility::VeryHigh)
        };

        let current_diastolic = current_diastolic.unwrap_or(current_systolic * 0.65);
        let diastolic_delta = systolic_delta * 0.5;

        ScenarioResult {
            current_systolic,
            current_diastolic,
            predicted_systolic,
            predicted_diastolic: current_diastolic + diastolic_delta,
            systolic_delta,
            diastolic_delta,
            confidence_interval,
            timeline_weeks,
            feasibility,
            recommendations: build_recommendations(current, hypothetical),
        }
    }
}

fn build_recommendations(
    current: &HashMap<String, f64>,
    hypothetical: &HashMap<String, f64>,
) -> Vec<String> {
    let mut recs = Vec::new();

    let increased = |feature: &str| -> Option<(f64, f64)> {
        let hyp = *hypothetical.get(feature)?;
        let cur = *current.get(feature)?;
        (hyp > cur).then_some((cur, hyp))
    };

    if increased("vo2_max").is_some() {
        recs.push("Increase cardio frequency to 4-5x per week".to_string());
        recs.push("Include 2 high-intensity interval sessions weekly".to_string());
    }
    if let Some((_, target)) = increased("sleep_hours") {
        recs.push(format!("Target {target:.1} hours of sleep nightly"));
    }
    if let Some((cur, target)) = increased("steps") {
        let diff = (target - cur).round() as i64;
        recs.push(format!(
            "Add {} daily steps through walking breaks",
            group_thousands(diff)
        ));
    }

    recs
}

/// Scenario analysis over the live store: current state comes from the
/// 90-day baselines, with fixed fallbacks where the store has nothing.
pub struct ScenarioEngine {
    store: Arc<dyn HealthStore>,
    analyzer: ScenarioAnalyzer,
}

impl ScenarioEngine {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self {
            store,
            analyzer: ScenarioAnalyzer::new(),
        }
    }

    /// Run a scenario where `changes` overwrite the user's current features.
    pub async fn run(&self, changes: &HashMap<String, f64>) -> Result<ScenarioResult, StoreError> {
        self.run_from(changes, None).await
    }

    /// Same, with an explicit starting systolic instead of the baseline.
    pub async fn run_from(
        &self,
        changes: &HashMap<String, f64>,
        systolic_override: Option<f64>,
    ) -> Result<ScenarioResult, StoreError> {
        let baselines = self.store.get_baselines().await?;

        let mut current = HashMap::new();
        current.insert(
            "vo2_max".to_string(),
            baselines.avg_vo2_max.unwrap_or(FALLBACK_VO2_MAX),
        );
        current.insert(
            "sleep_hours".to_string(),
            baselines.avg_sleep.unwrap_or(FALLBACK_SLEEP_HOURS),
        );
        current.insert(
            "steps".to_string(),
            baselines.avg_steps.unwrap_or(FALLBACK_STEPS),
        );
        current.insert("sleep_efficiency_pct".to_string(), FALLBACK_SLEEP_EFFICIENCY);

        let mut hypothetical = current.clone();
        for (feature, value) in changes {
            hypothetical.insert(feature.clone(), *value);
        }

        let systolic = systolic_override
            .or(baselines.avg_systolic)
            .unwrap_or(FALLBACK_SYSTOLIC);
        // An explicit starting point also invalidates the baseline diastolic
        let diastolic = if systolic_override.is_some() {
            None
        } else {
            baselines.avg_diastolic
        };

        debug!(changes = changes.len(), systolic, "Running scenario");

        Ok(self
            .analyzer
            .analyze(&current, &hypothetical, systolic, diastolic))
    }
}

/// Render a scenario result as display text for the CLI.
pub fn format_result(result: &ScenarioResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Current BP:   {:.0}/{:.0} mmHg\n",
        result.current_systolic, result.current_diastolic
    ));
    out.push_str(&format!(
        "Predicted BP: {:.0}/{:.0} mmHg ({:+.1} systolic)\n",
        result.predicted_systolic, result.predicted_diastolic, result.systolic_delta
    ));
    out.push_str(&format!(
        "Confidence:   {:.0}-{:.0} mmHg\n",
        result.confidence_interval.0, result.confidence_interval.1
    ));
    out.push_str(&format!(
        "Timeline:     ~{} weeks (feasibility: {})\n",
        result.timeline_weeks, result.feasibility
    ));
    if !result.recommendations.is_empty() {
        out.push_str("Recommendations:\n");
        for rec in &result.recommendations {
            out.push_str(&format!("  - {rec}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryStore;
    use chrono::NaiveDate;
    use vitacoach_core::DailyMetric;

    fn state(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn vo2_improvement_worked_example() {
        let result = ScenarioAnalyzer::new().analyze(
            &state(&[("vo2_max", 37.0)]),
            &state(&[("vo2_max", 42.0)]),
            140.0,
            None,
        );

        assert!((result.systolic_delta - -9.8).abs() < 1e-9);
        assert!((result.predicted_systolic - 130.2).abs() < 1e-9);
        assert!((result.confidence_interval.0 - 125.2).abs() < 1e-9);
        assert!((result.confidence_interval.1 - 135.2).abs() < 1e-9);
        assert_eq!(result.timeline_weeks, 6);
        assert_eq!(result.feasibility, Feasibility::High);

        // Diastolic estimated at 0.65x, moving at half the systolic rate
        assert!((result.current_diastolic - 91.0).abs() < 1e-9);
        assert!((result.diastolic_delta - -4.9).abs() < 1e-9);
        assert!((result.predicted_diastolic - 86.1).abs() < 1e-9);
    }

    #[test]
    fn identical_states_predict_no_change() {
        let features = state(&[("vo2_max", 40.0), ("sleep_hours", 7.0), ("steps", 9000.0)]);
        let result = ScenarioAnalyzer::new().analyze(&features, &features, 135.0, Some(85.0));

        assert_eq!(result.systolic_delta, 0.0);
        assert_eq!(result.predicted_systolic, 135.0);
        assert_eq!(result.predicted_diastolic, 85.0);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn only_shared_features_contribute() {
        // sleep_hours appears only in the hypothetical, so it cannot move BP
        let result = ScenarioAnalyzer::new().analyze(
            &state(&[("vo2_max", 37.0)]),
            &state(&[("vo2_max", 37.0), ("sleep_hours", 8.0)]),
            140.0,
            Some(88.0),
        );
        assert_eq!(result.systolic_delta, 0.0);
    }

    #[test]
    fn unknown_features_ignored() {
        let result = ScenarioAnalyzer::new().analyze(
            &state(&[("caffeine_mg", 300.0)]),
            &state(&[("caffeine_mg", 0.0)]),
            140.0,
            Some(88.0),
        );
        assert_eq!(result.systolic_delta, 0.0);
    }

    #[test]
    fn large_vo2_jump_lowers_feasibility() {
        let result = ScenarioAnalyzer::new().analyze(
            &state(&[("vo2_max", 37.0)]),
            &state(&[("vo2_max", 44.0)]),
            140.0,
            None,
        );
        assert_eq!(result.timeline_weeks, 12);
        assert_eq!(result.feasibility, Feasibility::Moderate);
    }

    #[test]
    fn small_changes_are_very_feasible() {
        let result = ScenarioAnalyzer::new().analyze(
            &state(&[("sleep_hours", 6.5)]),
            &state(&[("sleep_hours", 7.5)]),
            140.0,
            None,
        );
        assert_eq!(result.timeline_weeks, 4);
        assert_eq!(result.feasibility, Feasibility::VeryHigh);
        assert!((result.systolic_delta - -3.1).abs() < 1e-9);
    }

    #[test]
    fn recommendations_follow_increases() {
        let result = ScenarioAnalyzer::new().analyze(
            &state(&[("vo2_max", 37.0), ("sleep_hours", 6.5), ("steps", 8000.0)]),
            &state(&[("vo2_max", 40.0), ("sleep_hours", 7.5), ("steps", 10_500.0)]),
            140.0,
            None,
        );

        assert_eq!(
            result.recommendations,
            vec![
                "Increase cardio frequency to 4-5x per week".to_string(),
                "Include 2 high-intensity interval sessions weekly".to_string(),
                "Target 7.5 hours of sleep nightly".to_string(),
                "Add 2,500 daily steps through walking breaks".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn engine_uses_fallbacks_on_empty_store() {
        let engine = ScenarioEngine::new(Arc::new(MemoryStore::default()));
        let result = engine
            .run(&state(&[("vo2_max", 42.0)]))
            .await
            .unwrap();

        // Fallback vo2 37 -> 42 against fallback systolic 142
        assert!((result.current_systolic - 142.0).abs() < 1e-9);
        assert!((result.systolic_delta - -9.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn engine_prefers_stored_baselines() {
        let store = Arc::new(MemoryStore::default());
        let mut m = DailyMetric::empty(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap());
        m.systolic_mean = Some(136.0);
        m.diastolic_mean = Some(84.0);
        m.vo2_max = Some(39.0);
        m.sleep_hours = Some(7.0);
        m.steps = Some(9500);
        store.put_metric(m);

        let engine = ScenarioEngine::new(store);
        let result = engine.run(&state(&[("vo2_max", 41.0)])).await.unwrap();

        assert!((result.current_systolic - 136.0).abs() < 1e-9);
        assert!((result.current_diastolic - 84.0).abs() < 1e-9);
        assert!((result.systolic_delta - -3.92).abs() < 1e-9);
    }

    #[tokio::test]
    async fn explicit_starting_bp_overrides_baseline() {
        let store = Arc::new(MemoryStore::default());
        let mut m = DailyMetric::empty(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap());
        m.systolic_mean = Some(136.0);
        m.diastolic_mean = Some(84.0);
        store.put_metric(m);

        let engine = ScenarioEngine::new(store);
        let result = engine
            .run_from(&state(&[("sleep_hours", 8.0)]), Some(150.0))
            .await
            .unwrap();

        assert!((result.current_systolic - 150.0).abs() < 1e-9);
        // Diastolic re-estimated from the override, not the baseline
        assert!((result.current_diastolic - 97.5).abs() < 1e-9);
    }

    #[test]
    fn format_mentions_prediction_and_feasibility() {
        let result = ScenarioAnalyzer::new().analyze(
            &state(&[("vo2_max", 37.0)]),
            &state(&[("vo2_max", 42.0)]),
            140.0,
            None,
        );
        let text = format_result(&result);
        assert!(text.contains("130/86 mmHg"));
        assert!(text.contains("feasibility: HIGH"));
        assert!(text.contains("cardio"));
    }
}
