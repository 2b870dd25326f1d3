//! What-if scenario result types.

use serde::{Deserialize, Serialize};

/// How attainable a hypothetical change is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feasibility {
    Moderate,
    High,
    VeryHigh,
}

impl Feasibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::VeryHigh => "VERY HIGH",
        }
    }
}

impl std::fmt::Display for Feasibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a what-if scenario analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Current systolic BP (mmHg).
    pub current_systolic: f64,

    /// Current diastolic BP; estimated as 0.65 × systolic when not measured.
    pub current_diastolic: f64,

    /// Predicted systolic BP after the change.
    pub predicted_systolic: f64,

    /// Predicted diastolic BP after the change.
    pub predicted_diastolic: f64,

    /// Change in systolic BP (negative = improvement).
    pub systolic_delta: f64,

    /// Change in diastolic BP, fixed at half the systolic delta.
    pub diastolic_delta: f64,

    /// Fixed ±5 mmHg band around the predicted systolic.
    pub confidence_interval: (f64, f64),

    /// Estimated weeks to realize the change.
    pub timeline_weeks: u32,

    /// Categorical attainability label.
    pub feasibility: Feasibility,

    /// Actionable recommendation lines, order-stable.
    pub recommendations: Vec<String>,
}
