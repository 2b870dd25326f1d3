//! Classified-intent value types.
//!
//! A `ClassifiedIntent` is produced fresh per query by the intent classifier
//! and never persisted directly — its pieces are folded into the conversation
//! turn record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The classified purpose of a user query.
///
/// Variants are listed in classification priority order: the classifier
/// checks trigger sets in exactly this sequence and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// "What was my BP yesterday?"
    DataLookup,
    /// "Why was my BP high?"
    Explanation,
    /// "What will my BP be tomorrow?"
    Prediction,
    /// "What if I sleep 8 hours?"
    Scenario,
    /// "How can I lower my BP?"
    Recommendation,
    /// "How has my BP changed this month?"
    Trend,
    /// "Compare my weekday vs weekend BP"
    Comparison,
    /// Anything else.
    General,
}

impl IntentKind {
    /// Stable string form used in persisted turn records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataLookup => "data_lookup",
            Self::Explanation => "explanation",
            Self::Prediction => "prediction",
            Self::Scenario => "scenario",
            Self::Recommendation => "recommendation",
            Self::Trend => "trend",
            Self::Comparison => "comparison",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive date range resolved from query text.
///
/// A single day is represented as `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateScope {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateScope {
    /// A scope covering exactly one day.
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// An inclusive range.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the scope covers exactly one day.
    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }
}

/// Entities extracted from query text, best effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEntities {
    /// The first metric keyword found, normalized (e.g. "blood pressure" → "bp").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,

    /// Every numeric literal in the text, in order of appearance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numbers: Vec<f64>,
}

impl QueryEntities {
    pub fn is_empty(&self) -> bool {
        self.metric.is_none() && self.numbers.is_empty()
    }

    /// Flatten into name → value pairs for prompt/context rendering.
    pub fn as_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(metric) = &self.metric {
            map.insert("metric".into(), metric.clone());
        }
        if !self.numbers.is_empty() {
            let joined = self
                .numbers
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            map.insert("numbers".into(), joined);
        }
        map
    }
}

/// Result of intent classification for a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    /// Which intent matched (first match wins over the ordered table).
    pub kind: IntentKind,

    /// Classification confidence in [0, 1]. Fixed at 0.85 for a trigger
    /// match, 0.5 for the general fallback.
    pub confidence: f64,

    /// Resolved date scope, when the query mentions one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_scope: Option<DateScope>,

    /// Extracted entities.
    #[serde(default)]
    pub entities: QueryEntities,
}

impl ClassifiedIntent {
    /// The default classification for queries that match no trigger set.
    pub fn general() -> Self {
        Self {
            kind: IntentKind::General,
            confidence: 0.5,
            date_scope: None,
            entities: QueryEntities::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_kind_string_form() {
        assert_eq!(IntentKind::DataLookup.as_str(), "data_lookup");
        assert_eq!(IntentKind::General.to_string(), "general");
    }

    #[test]
    fn single_day_scope() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let scope = DateScope::single(day);
        assert!(scope.is_single_day());
        assert_eq!(scope.start, scope.end);
    }

    #[test]
    fn general_fallback_defaults() {
        let intent = ClassifiedIntent::general();
        assert_eq!(intent.kind, IntentKind::General);
        assert!((intent.confidence - 0.5).abs() < f64::EPSILON);
        assert!(intent.date_scope.is_none());
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn entities_map_rendering() {
        let entities = QueryEntities {
            metric: Some("bp".into()),
            numbers: vec![8.0, 140.0],
        };
        let map = entities.as_map();
        assert_eq!(map.get("metric").map(String::as_str), Some("bp"));
        assert_eq!(map.get("numbers").map(String::as_str), Some("8, 140"));
    }
}
