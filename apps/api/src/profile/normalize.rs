//! Response Normalizer — turns the summary agent's loosely-typed output into
//! a fully-populated `ProcessedProfileSummary`.
//!
//! The upstream agent is a best-effort text generator: its output is neither
//! guaranteed valid JSON nor schema-stable. Every field here is defaulted so
//! downstream consumers never see a hole, and already-normalized payloads
//! re-normalize to themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

const UNKNOWN: &str = "Unknown";

/// One structured "recent work item" extracted from the agent's delimited
/// text encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// Fully-populated profile summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedProfileSummary {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "recentContributions")]
    pub recent_contributions: Vec<Contribution>,
}

/// Normalizes a raw agent output map. Non-map input yields the all-empty
/// summary (degraded path, never a panic).
pub fn process_profile_response(raw: &Value) -> ProcessedProfileSummary {
    let Some(map) = raw.as_object() else {
        warn!("agent output is not a map, returning empty summary");
        return ProcessedProfileSummary::default();
    };

    let mut processed = ProcessedProfileSummary::default();

    processed.role = match map.get("role").and_then(Value::as_str) {
        Some(role) if !role.is_empty() && role != UNKNOWN => role.to_string(),
        _ => "Not Specified".to_string(),
    };

    processed.team = match map.get("team").and_then(Value::as_str) {
        Some(team) if !team.is_empty() => team.to_string(),
        _ => "Not Specified".to_string(),
    };

    processed.summary = match map.get("summary").and_then(Value::as_str) {
        Some(summary) if !summary.is_empty() => summary.to_string(),
        _ => "No summary available".to_string(),
    };

    processed.tags = match map.get("tags") {
        Some(Value::String(tags)) => split_tags(tags),
        // Already-normalized payloads carry tags as an array; accept them so
        // re-normalizing stored output is lossless.
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != UNKNOWN)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    if processed.tags.is_empty() {
        processed.tags = vec![String::new()];
    }

    let contributions = match map.get("recentContributions") {
        Some(Value::String(encoded)) if !encoded.is_empty() => parse_contributions(encoded),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<Contribution>(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    };
    processed.recent_contributions = contributions
        .into_iter()
        .filter(|c| !c.title.is_empty() && c.title != UNKNOWN)
        .collect();
    if processed.recent_contributions.is_empty() {
        processed.recent_contributions = vec![placeholder_contribution()];
    }

    processed
}

/// Parses the agent's `|`-delimited key/value encoding of contributions.
///
/// Tokens are consumed in (key, value) pairs; a trailing unpaired token is
/// ignored, and a pair with an empty key or value is skipped. Keys dispatch
/// by prefix, never exact match — the agent emits suffix-numbered keys like
/// `title1`, `tags2`.
pub fn parse_contributions(encoded: &str) -> Vec<Contribution> {
    let parts: Vec<&str> = encoded.split('|').collect();

    let mut contributions: Vec<Contribution> = Vec::new();
    let mut current = Contribution::default();

    for pair in parts.chunks_exact(2) {
        let key = pair[0].trim();
        let value = pair[1].trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }

        if key.starts_with("title") {
            // Keys seen before any title accumulate into a titleless
            // contribution that is discarded here.
            if !current.title.is_empty() {
                contributions.push(current);
            }
            current = Contribution {
                title: value.to_string(),
                ..Contribution::default()
            };
        } else if key.starts_with("description") {
            current.description = value.to_string();
        } else if key.starts_with("tags") {
            if value != UNKNOWN {
                current.tags.extend(split_tags(value));
            }
            if current.tags.is_empty() {
                current.tags = vec!["No tags".to_string()];
            }
        } else if key.starts_with("documents") {
            if value != UNKNOWN {
                current.documents.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty() && *d != UNKNOWN)
                        .map(str::to_string),
                );
            }
        }
    }

    if !current.title.is_empty() {
        contributions.push(current);
    }

    // A contribution whose title was never followed by a tags key still
    // reports "No tags".
    for contribution in &mut contributions {
        if contribution.tags.is_empty() {
            contribution.tags = vec!["No tags".to_string()];
        }
    }

    contributions
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != UNKNOWN)
        .map(str::to_string)
        .collect()
}

fn placeholder_contribution() -> Contribution {
    Contribution {
        title: "No Recent Contributions".to_string(),
        description: "No recent contributions found for this user".to_string(),
        tags: vec!["No Data".to_string()],
        documents: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_take_documented_defaults() {
        let processed = process_profile_response(&json!({}));
        assert_eq!(processed.role, "Not Specified");
        assert_eq!(processed.team, "Not Specified");
        assert_eq!(processed.summary, "No summary available");
        assert_eq!(processed.tags, vec![String::new()]);
        assert_eq!(processed.recent_contributions, vec![placeholder_contribution()]);
    }

    #[test]
    fn test_unknown_role_is_not_specified_but_unknown_team_is_kept() {
        let processed = process_profile_response(&json!({
            "role": "Unknown",
            "team": "Unknown",
        }));
        assert_eq!(processed.role, "Not Specified");
        assert_eq!(processed.team, "Unknown");
    }

    #[test]
    fn test_populated_fields_pass_through() {
        let processed = process_profile_response(&json!({
            "role": "Backend Engineer",
            "team": "Payments",
            "summary": "Ships payment infra.",
        }));
        assert_eq!(processed.role, "Backend Engineer");
        assert_eq!(processed.team, "Payments");
        assert_eq!(processed.summary, "Ships payment infra.");
    }

    #[test]
    fn test_tags_are_split_trimmed_and_filtered() {
        let processed = process_profile_response(&json!({"tags": "a, Unknown, ,b"}));
        assert_eq!(processed.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_all_invalid_tags_default_to_single_empty_entry() {
        let processed = process_profile_response(&json!({"tags": "Unknown, ,"}));
        assert_eq!(processed.tags, vec![String::new()]);
    }

    #[test]
    fn test_non_map_input_yields_empty_summary() {
        for raw in [json!("just text"), json!(42), json!([1, 2, 3]), json!(null)] {
            let processed = process_profile_response(&raw);
            assert_eq!(processed, ProcessedProfileSummary::default());
        }
    }

    #[test]
    fn test_parse_contributions_two_items() {
        let parsed =
            parse_contributions("title1|A|description1|d|tags1|x, Unknown,y|title2|B");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].title, "A");
        assert_eq!(parsed[0].description, "d");
        assert_eq!(parsed[0].tags, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(parsed[1].title, "B");
        assert_eq!(parsed[1].description, "");
        assert_eq!(parsed[1].tags, vec!["No tags".to_string()]);
        assert!(parsed[1].documents.is_empty());
    }

    #[test]
    fn test_parse_contributions_empty_input() {
        assert!(parse_contributions("").is_empty());

        // The normalizer substitutes the placeholder for the empty list.
        let processed = process_profile_response(&json!({"recentContributions": ""}));
        assert_eq!(processed.recent_contributions, vec![placeholder_contribution()]);
    }

    #[test]
    fn test_parse_contributions_ignores_trailing_unpaired_token() {
        let parsed = parse_contributions("title1|A|orphan");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "A");
    }

    #[test]
    fn test_parse_contributions_skips_pairs_with_empty_sides() {
        let parsed = parse_contributions("title1|A| |x|description1| |tags1|rust");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "A");
        assert_eq!(parsed[0].description, "");
        assert_eq!(parsed[0].tags, vec!["rust".to_string()]);
    }

    #[test]
    fn test_parse_contributions_description_last_wins() {
        let parsed = parse_contributions("title1|A|description1|first|description2|second");
        assert_eq!(parsed[0].description, "second");
    }

    #[test]
    fn test_parse_contributions_documents_are_split_and_filtered() {
        let parsed = parse_contributions("title1|A|documents1|doc1, Unknown ,doc2");
        assert_eq!(
            parsed[0].documents,
            vec!["doc1".to_string(), "doc2".to_string()]
        );

        let parsed = parse_contributions("title1|A|documents1|Unknown");
        assert!(parsed[0].documents.is_empty());
    }

    #[test]
    fn test_parse_contributions_keys_before_first_title_are_dropped() {
        let parsed = parse_contributions("tags1|lost|description1|lost too|title1|A");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "A");
        assert_eq!(parsed[0].description, "");
        assert_eq!(parsed[0].tags, vec!["No tags".to_string()]);
    }

    #[test]
    fn test_parse_contributions_unknown_keys_are_ignored() {
        let parsed = parse_contributions("title1|A|mood1|great|tags1|rust");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].tags, vec!["rust".to_string()]);
    }

    #[test]
    fn test_unknown_titled_contributions_are_dropped() {
        let processed = process_profile_response(&json!({
            "recentContributions": "title1|Unknown|title2|Real work",
        }));
        assert_eq!(processed.recent_contributions.len(), 1);
        assert_eq!(processed.recent_contributions[0].title, "Real work");
    }

    #[test]
    fn test_normalizer_is_idempotent_over_reserialized_output() {
        let raw = json!({
            "role": "Backend Engineer",
            "team": "Payments",
            "summary": "Ships payment infra.",
            "tags": "rust, postgres",
            "recentContributions": "title1|Ledger rewrite|description1|Moved to event sourcing|tags1|rust|documents1|1001,1002|title2|Oncall tooling",
        });
        let first = process_profile_response(&raw);
        let reserialized = serde_json::to_value(&first).unwrap();
        let second = process_profile_response(&reserialized);
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalizer_is_idempotent_over_defaulted_output() {
        let first = process_profile_response(&json!({}));
        let reserialized = serde_json::to_value(&first).unwrap();
        let second = process_profile_response(&reserialized);
        assert_eq!(first, second);
    }
}
