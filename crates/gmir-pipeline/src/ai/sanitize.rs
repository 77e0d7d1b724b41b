//! Normalization of model drafts into persistable report items.
//!
//! Model output is untrusted: every field is coerced to its expected type,
//! strings are length-capped and scores are clamped, so a draft of any shape
//! yields a valid item.

use chrono::{DateTime, Utc};
use gmir_core::Region;
use serde_json::Value;

use super::response::ReportItemDraft;
use crate::types::ReportItem;

const MAX_TITLE_CHARS: usize = 500;
const MAX_IMPACT_CHARS: usize = 1000;
const MAX_SOURCE_URL_CHARS: usize = 2000;
const MAX_SOURCE_NAME_CHARS: usize = 200;

#[must_use]
pub fn sanitize_draft(draft: &ReportItemDraft, processed_at: DateTime<Utc>) -> ReportItem {
    let text = |name: &str, max: usize| truncate_chars(&coerce_text(draft.field(name)), max);

    ReportItem {
        region: coerce_region(draft.field("region")),
        title_en: text("title_en", MAX_TITLE_CHARS),
        title_ko: text("title_ko", MAX_TITLE_CHARS),
        summary_en: coerce_list(draft.field("summary_en")),
        summary_ko: coerce_list(draft.field("summary_ko")),
        impact_en: text("impact_en", MAX_IMPACT_CHARS),
        impact_ko: text("impact_ko", MAX_IMPACT_CHARS),
        tags: coerce_list(draft.field("tags")),
        confidence: coerce_score(draft.field("confidence")),
        relevance_score: coerce_score(draft.field("relevance_score")),
        source_url: text("source_url", MAX_SOURCE_URL_CHARS),
        source_name: text("source_name", MAX_SOURCE_NAME_CHARS),
        published_at: processed_at,
    }
}

#[must_use]
pub fn sanitize_drafts(drafts: &[ReportItemDraft], processed_at: DateTime<Utc>) -> Vec<ReportItem> {
    drafts
        .iter()
        .map(|draft| sanitize_draft(draft, processed_at))
        .collect()
}

/// Falsy values (missing, null, false, 0, "") become empty; anything else is
/// stringified.
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(other) => stringify(other),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(values) => values
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => stringify(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values.iter().map(stringify).collect(),
        _ => Vec::new(),
    }
}

/// Numbers, numeric strings and booleans coerce; everything else is 0.
/// The result is clamped to `[0, 1]`.
fn coerce_score(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::Bool(true)) => 1.0,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                // Only the exact `Infinity` spellings are numeric; `inf`,
                // `infinity` and `NaN` text coerce to 0.
                Ok(v) if matches!(trimmed, "Infinity" | "+Infinity" | "-Infinity") => v,
                _ => 0.0,
            }
        }
        _ => 0.0,
    };
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

fn coerce_region(value: Option<&Value>) -> Region {
    value
        .and_then(Value::as_str)
        .map_or(Region::Unknown, Region::from_label)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sanitize(value: Value) -> ReportItem {
        sanitize_draft(&ReportItemDraft(value), Utc::now())
    }

    #[test]
    fn out_of_range_values_are_normalized() {
        let item = sanitize(json!({
            "confidence": 5,
            "region": "XX",
            "tags": "notanarray"
        }));
        assert!((item.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(item.region, Region::Unknown);
        assert!(item.tags.is_empty());
    }

    #[test]
    fn well_formed_draft_passes_through() {
        let item = sanitize(json!({
            "title_en": "Maps adds EV routing",
            "title_ko": "지도 EV 경로",
            "summary_en": ["one", "two"],
            "summary_ko": ["하나"],
            "impact_en": "Routing matters",
            "impact_ko": "중요",
            "tags": ["ev", "routing"],
            "confidence": 0.8,
            "relevance_score": "0.65",
            "region": "KR",
            "source_url": "https://e.com/1",
            "source_name": "Example"
        }));
        assert_eq!(item.title_en, "Maps adds EV routing");
        assert_eq!(item.summary_en, vec!["one", "two"]);
        assert_eq!(item.region, Region::Kr);
        assert!((item.confidence - 0.8).abs() < f64::EPSILON);
        assert!((item.relevance_score - 0.65).abs() < f64::EPSILON);
        assert_eq!(item.source_name, "Example");
    }

    #[test]
    fn strings_are_truncated_by_characters() {
        let long_title = "가".repeat(600);
        let item = sanitize(json!({
            "title_en": long_title,
            "impact_en": "x".repeat(1500),
            "source_url": "u".repeat(2500),
            "source_name": "n".repeat(300)
        }));
        assert_eq!(item.title_en.chars().count(), 500);
        assert_eq!(item.impact_en.len(), 1000);
        assert_eq!(item.source_url.len(), 2000);
        assert_eq!(item.source_name.len(), 200);
    }

    #[test]
    fn falsy_and_non_string_text_fields() {
        let item = sanitize(json!({
            "title_en": null,
            "title_ko": false,
            "impact_en": 0,
            "impact_ko": 42,
            "source_name": true,
            "source_url": {"href": "x"}
        }));
        assert_eq!(item.title_en, "");
        assert_eq!(item.title_ko, "");
        assert_eq!(item.impact_en, "");
        assert_eq!(item.impact_ko, "42");
        assert_eq!(item.source_name, "true");
        assert_eq!(item.source_url, "[object Object]");
    }

    #[test]
    fn list_elements_are_stringified() {
        let item = sanitize(json!({ "tags": ["a", 1, true, null] }));
        assert_eq!(item.tags, vec!["a", "1", "true", "null"]);
    }

    #[test]
    fn score_coercion() {
        let score = |v: Value| sanitize(json!({ "confidence": v })).confidence;
        assert!((score(json!(-3)) - 0.0).abs() < f64::EPSILON);
        assert!((score(json!(true)) - 1.0).abs() < f64::EPSILON);
        assert!((score(json!(false)) - 0.0).abs() < f64::EPSILON);
        assert!((score(json!("high")) - 0.0).abs() < f64::EPSILON);
        assert!((score(json!(" 0.25 ")) - 0.25).abs() < f64::EPSILON);
        assert!((score(json!("NaN")) - 0.0).abs() < f64::EPSILON);
        assert!((score(json!([0.5])) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_infinity_text_scores_zero() {
        let score = |v: Value| sanitize(json!({ "relevance_score": v })).relevance_score;
        for text in ["inf", "infinity", "INF", "-inf"] {
            assert!(score(json!(text)).abs() < f64::EPSILON, "{text}");
        }
        assert!((score(json!("Infinity")) - 1.0).abs() < f64::EPSILON);
        assert!(score(json!("-Infinity")).abs() < f64::EPSILON);
    }

    #[test]
    fn non_object_draft_yields_empty_item() {
        let item = sanitize(json!("oops"));
        assert_eq!(item.title_en, "");
        assert_eq!(item.region, Region::Unknown);
        assert!(item.summary_en.is_empty());
        assert!((item.confidence - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn published_at_is_processing_time() {
        let now = Utc::now();
        let item = sanitize_draft(&ReportItemDraft(json!({})), now);
        assert_eq!(item.published_at, now);
    }
}
