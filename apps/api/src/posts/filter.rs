//! Content filter verdict parsing. The filter agent's output is treated the
//! same way as the summary agent's: loosely typed, defaulted field by field.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const CATEGORY_QUESTION: &str = "Question";
pub const CATEGORY_POST: &str = "Post";
pub const CATEGORY_OTHERS: &str = "Others";
pub const CATEGORY_APPRECIATION: &str = "Appreciation";

/// Structured verdict from the content filter agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterVerdict {
    #[serde(rename = "isProblematic", default)]
    pub is_problematic: bool,
    #[serde(rename = "helpText", default)]
    pub help_text: String,
    #[serde(rename = "contentCategory", default)]
    pub content_category: String,
    #[serde(rename = "englishContent", default)]
    pub english_content: String,
}

/// Extracts a verdict from the workflow's raw outputs. Missing fields and a
/// non-map payload fall back to the zero verdict (not problematic).
pub fn parse_filter_verdict(raw: Option<&Value>) -> FilterVerdict {
    let Some(map) = raw.and_then(Value::as_object) else {
        warn!("content filter output is not a map, treating as clean");
        return FilterVerdict::default();
    };

    let mut verdict = FilterVerdict::default();
    if let Some(flag) = map.get("isProblematic").and_then(Value::as_bool) {
        verdict.is_problematic = flag;
    }
    if let Some(text) = map.get("helpText").and_then(Value::as_str) {
        verdict.help_text = text.to_string();
    }
    if let Some(category) = map.get("contentCategory").and_then(Value::as_str) {
        verdict.content_category = category.to_string();
    }
    if let Some(content) = map.get("englishContent").and_then(Value::as_str) {
        verdict.english_content = content.to_string();
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_verdict_is_parsed() {
        let raw = json!({
            "isProblematic": true,
            "helpText": "Please keep it civil.",
            "contentCategory": "Others",
            "englishContent": "translated",
        });
        let verdict = parse_filter_verdict(Some(&raw));
        assert!(verdict.is_problematic);
        assert_eq!(verdict.help_text, "Please keep it civil.");
        assert_eq!(verdict.content_category, CATEGORY_OTHERS);
        assert_eq!(verdict.english_content, "translated");
    }

    #[test]
    fn test_partial_verdict_defaults_missing_fields() {
        let raw = json!({"contentCategory": "Question"});
        let verdict = parse_filter_verdict(Some(&raw));
        assert!(!verdict.is_problematic);
        assert_eq!(verdict.help_text, "");
        assert_eq!(verdict.content_category, CATEGORY_QUESTION);
    }

    #[test]
    fn test_wrongly_typed_fields_are_ignored() {
        let raw = json!({"isProblematic": "yes", "helpText": 5});
        let verdict = parse_filter_verdict(Some(&raw));
        assert_eq!(verdict, FilterVerdict::default());
    }

    #[test]
    fn test_non_map_payload_is_clean() {
        assert_eq!(parse_filter_verdict(None), FilterVerdict::default());
        assert_eq!(
            parse_filter_verdict(Some(&json!("nope"))),
            FilterVerdict::default()
        );
    }
}
