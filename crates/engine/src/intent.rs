//! Regex-based intent classification.
//!
//! The trigger table is ordered by intent priority and the first matching
//! pattern wins at a fixed 0.85 confidence; everything else is `General` at
//! 0.5. Date-scope and entity extraction run independently of which intent
//! matched, so a general query can still carry a resolved date range.

use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Regex;

use vitacoach_core::{ClassifiedIntent, DateScope, IntentKind, QueryEntities};

/// Metric vocabulary, checked in order; "blood pressure" normalizes to "bp".
const METRIC_VOCAB: [&str; 7] = [
    "bp",
    "blood pressure",
    "sleep",
    "steps",
    "vo2",
    "heart rate",
    "hrv",
];

/// Classifies queries against an ordered trigger table built once.
pub struct IntentClassifier {
    triggers: Vec<(IntentKind, Vec<Regex>)>,
    month_day: Regex,
    number: Regex,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        // Patterns run against lowercased text. Table order is the
        // classification priority order.
        let table: [(IntentKind, &[&str]); 7] = [
            (
                IntentKind::DataLookup,
                &[
                    r"what was my (bp|blood pressure|sleep|steps)",
                    r"show me my",
                    r"my (bp|blood pressure) on",
                    r"how much did i (sleep|walk)",
                    r"(sleep|steps|bp|heart rate) data",
                ],
            ),
            (
                IntentKind::Explanation,
                &[r"why (was|is|did)", r"what caused", r"explain", r"reason for"],
            ),
            (
                IntentKind::Prediction,
                &[r"what will", r"predict", r"forecast", r"expect"],
            ),
            (
                IntentKind::Scenario,
                &[
                    r"what if",
                    r"if i (sleep|exercise|walk)",
                    r"hypothetically",
                    r"scenario",
                ],
            ),
            (
                IntentKind::Recommendation,
                &[
                    r"how (can|do|should) i",
                    r"recommend",
                    r"suggest",
                    r"tips for",
                    r"advice",
                ],
            ),
            (
                IntentKind::Trend,
                &[r"trend", r"over (time|the past)", r"changed", r"progress"],
            ),
            (
                IntentKind::Comparison,
                &[r"compare", r"\bvs\b", r"versus", r"difference between"],
            ),
        ];

        let triggers = table
            .into_iter()
            .map(|(kind, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("bad pattern {p}: {e}")))
                    .collect();
                (kind, compiled)
            })
            .collect();

        let month_day = Regex::new(
            r"\b(january|february|march|april|may|june|july|august|september|october|november|december) (\d{1,2})(?:st|nd|rd|th)?\b",
        )
        .unwrap_or_else(|e| panic!("bad month-day pattern: {e}"));

        let number = Regex::new(r"\b(\d+(?:\.\d+)?)\b")
            .unwrap_or_else(|e| panic!("bad number pattern: {e}"));

        Self {
            triggers,
            month_day,
            number,
        }
    }

    /// Classify using the local calendar date as "today".
    pub fn classify(&self, query: &str) -> ClassifiedIntent {
        self.classify_at(query, Local::now().date_naive())
    }

    /// Deterministic core: all relative dates resolve against `today`.
    pub fn classify_at(&self, query: &str, today: NaiveDate) -> ClassifiedIntent {
        let lower = query.to_lowercase();

        let mut kind = IntentKind::General;
        let mut confidence = 0.5;

        'outer: for (candidate, patterns) in &self.triggers {
            for pattern in patterns {
                if pattern.is_match(&lower) {
                    kind = *candidate;
                    confidence = 0.85;
                    break 'outer;
                }
            }
        }

        ClassifiedIntent {
            kind,
            confidence,
            date_scope: self.extract_date_scope(&lower, today),
            entities: self.extract_entities(&lower),
        }
    }

    /// Resolve a date scope from fixed relative phrases, then explicit
    /// "Month Day" mentions anchored to the current year.
    fn extract_date_scope(&self, lower: &str, today: NaiveDate) -> Option<DateScope> {
        if lower.contains("yesterday") {
            return Some(DateScope::single(today - Duration::days(1)));
        }
        if lower.contains("today") {
            return Some(DateScope::single(today));
        }
        if lower.contains("last week") {
            return Some(DateScope::range(today - Duration::days(7), today));
        }
        if lower.contains("this week") {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            return Some(DateScope::range(monday, today));
        }
        if lower.contains("last month") {
            return Some(DateScope::range(today - Duration::days(30), today));
        }

        if let Some(caps) = self.month_day.captures(lower) {
            let month = month_number(&caps[1]);
            if let Ok(day) = caps[2].parse::<u32>() {
                if let Some(date) = NaiveDate::from_ymd_opt(today.year(), month, day) {
                    return Some(DateScope::single(date));
                }
            }
        }

        None
    }

    fn extract_entities(&self, lower: &str) -> QueryEntities {
        let metric = METRIC_VOCAB.iter().find(|m| lower.contains(**m)).map(|m| {
            if *m == "blood pressure" {
                "bp".to_string()
            } else {
                (*m).to_string()
            }
        });

        let numbers = self
            .number
            .captures_iter(lower)
            .filter_map(|c| c[1].parse::<f64>().ok())
            .collect();

        QueryEntities { metric, numbers }
    }
}

fn month_number(name: &str) -> u32 {
    match name {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        _ => 12,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2025-06-18 is a Wednesday
    const TODAY: (i32, u32, u32) = (2025, 6, 18);

    fn today() -> NaiveDate {
        day(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn bp_yesterday_lookup() {
        let intent = classifier().classify_at("What was my BP yesterday?", today());
        assert_eq!(intent.kind, IntentKind::DataLookup);
        assert!((intent.confidence - 0.85).abs() < f64::EPSILON);
        assert_eq!(
            intent.date_scope,
            Some(DateScope::single(day(2025, 6, 17)))
        );
        assert_eq!(intent.entities.metric.as_deref(), Some("bp"));
    }

    #[test]
    fn first_match_wins_over_later_intents() {
        // "why" (explanation) outranks "changed" (trend)
        let intent = classifier().classify_at("Why did my sleep change?", today());
        assert_eq!(intent.kind, IntentKind::Explanation);
    }

    #[test]
    fn data_lookup_outranks_everything() {
        // Matches both data_lookup and recommendation triggers
        let intent =
            classifier().classify_at("Show me my steps and suggest improvements", today());
        assert_eq!(intent.kind, IntentKind::DataLookup);
    }

    #[test]
    fn scenario_detection() {
        let intent = classifier().classify_at("What if I sleep 8 hours?", today());
        assert_eq!(intent.kind, IntentKind::Scenario);
        assert_eq!(intent.entities.numbers, vec![8.0]);
        assert_eq!(intent.entities.metric.as_deref(), Some("sleep"));
    }

    #[test]
    fn prediction_detection() {
        let intent = classifier().classify_at("What will my BP be tomorrow?", today());
        assert_eq!(intent.kind, IntentKind::Prediction);
    }

    #[test]
    fn comparison_vs_word_boundary() {
        let intent = classifier().classify_at("weekday vs weekend bp", today());
        assert_eq!(intent.kind, IntentKind::Comparison);

        // "vs" inside a word must not trigger
        let other = classifier().classify_at("my bp readings overseas", today());
        assert_eq!(other.kind, IntentKind::General);
    }

    #[test]
    fn general_fallback() {
        let intent = classifier().classify_at("hello there", today());
        assert_eq!(intent.kind, IntentKind::General);
        assert!((intent.confidence - 0.5).abs() < f64::EPSILON);
        assert!(intent.date_scope.is_none());
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn last_week_range() {
        let intent = classifier().classify_at("show me my sleep last week", today());
        assert_eq!(
            intent.date_scope,
            Some(DateScope::range(day(2025, 6, 11), today()))
        );
    }

    #[test]
    fn this_week_starts_monday() {
        // Wednesday the 18th -> Monday the 16th
        let intent = classifier().classify_at("show me my steps this week", today());
        assert_eq!(
            intent.date_scope,
            Some(DateScope::range(day(2025, 6, 16), today()))
        );
    }

    #[test]
    fn last_month_is_trailing_30_days() {
        let intent = classifier().classify_at("how has my bp changed last month", today());
        assert_eq!(
            intent.date_scope,
            Some(DateScope::range(day(2025, 5, 19), today()))
        );
    }

    #[test]
    fn explicit_month_day_current_year() {
        let intent = classifier().classify_at("my bp on January 10", today());
        assert_eq!(intent.date_scope, Some(DateScope::single(day(2025, 1, 10))));
    }

    #[test]
    fn ordinal_suffix_handled() {
        let intent = classifier().classify_at("show me my sleep on March 3rd", today());
        assert_eq!(intent.date_scope, Some(DateScope::single(day(2025, 3, 3))));

        // "August 1st" must not lose its digit to suffix stripping
        let august = classifier().classify_at("my bp on August 1st", today());
        assert_eq!(august.date_scope, Some(DateScope::single(day(2025, 8, 1))));
    }

    #[test]
    fn invalid_calendar_day_ignored() {
        let intent = classifier().classify_at("my bp on February 30", today());
        assert!(intent.date_scope.is_none());
    }

    #[test]
    fn relative_phrase_outranks_explicit_date() {
        let intent =
            classifier().classify_at("compare yesterday with January 10", today());
        assert_eq!(
            intent.date_scope,
            Some(DateScope::single(day(2025, 6, 17)))
        );
    }

    #[test]
    fn blood_pressure_normalizes_to_bp() {
        let intent = classifier().classify_at("what was my blood pressure today", today());
        assert_eq!(intent.entities.metric.as_deref(), Some("bp"));
    }

    #[test]
    fn all_numbers_extracted_in_order() {
        let intent = classifier().classify_at(
            "if i walk 10000 steps and sleep 7.5 hours",
            today(),
        );
        assert_eq!(intent.entities.numbers, vec![10_000.0, 7.5]);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let a = c.classify_at("What was my BP yesterday?", today());
        let b = c.classify_at("What was my BP yesterday?", today());
        assert_eq!(a, b);
    }
}
