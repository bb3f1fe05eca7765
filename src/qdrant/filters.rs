//! Filter helpers for Qdrant search queries.

use serde_json::{Value, json};

use super::types::SearchFilterArgs;

/// Compose the Qdrant `must` filter from optional exact-match arguments.
pub fn build_search_filter(args: &SearchFilterArgs) -> Option<Value> {
    let must: Vec<Value> = [
        ("kind", args.kind.as_deref()),
        ("category", args.category.as_deref()),
        ("candidate_id", args.candidate_id.as_deref()),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.and_then(non_empty).map(|value| (key, value)))
    .map(|(key, value)| {
        json!({
            "key": key,
            "match": { "value": value }
        })
    })
    .collect();

    if must.is_empty() {
        None
    } else {
        Some(json!({ "must": must }))
    }
}

fn non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_search_filter_handles_category() {
        let filter = build_search_filter(&SearchFilterArgs {
            kind: Some("category".into()),
            category: Some("skills".into()),
            ..Default::default()
        })
        .expect("filter");

        assert_eq!(
            filter,
            json!({
                "must": [
                    { "key": "kind", "match": { "value": "category" } },
                    { "key": "category", "match": { "value": "skills" } }
                ]
            })
        );
    }

    #[test]
    fn build_search_filter_skips_blank_values() {
        let filter = build_search_filter(&SearchFilterArgs {
            kind: Some("resume".into()),
            category: Some("   ".into()),
            ..Default::default()
        })
        .expect("filter");

        assert_eq!(
            filter,
            json!({ "must": [ { "key": "kind", "match": { "value": "resume" } } ] })
        );
    }

    #[test]
    fn build_search_filter_returns_none_when_empty() {
        assert!(build_search_filter(&SearchFilterArgs::default()).is_none());
    }
}
