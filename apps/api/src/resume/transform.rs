//! Résumé shaping: storage fields out, theme projection, then optional
//! pagination of `work`.

use serde_json::{json, Map, Value};

use crate::resume::params::{Page, Theme};

/// Top-level fields that belong to storage, never to the résumé itself.
pub const STORAGE_FIELDS: [&str; 9] = [
    "_rid",
    "_self",
    "_etag",
    "_attachments",
    "_ts",
    "id",
    "lang",
    "sections",
    "count",
];

pub fn strip_storage_fields(mut doc: Value) -> Value {
    if let Some(map) = doc.as_object_mut() {
        map.retain(|k, _| !STORAGE_FIELDS.contains(&k.as_str()));
    }
    doc
}

/// `Theme::Minimal` keeps only `basics` (default `{}`) and `work` (default `[]`).
pub fn apply_theme(doc: Value, theme: Theme) -> Value {
    match theme {
        Theme::Full => doc,
        Theme::Minimal => {
            let basics = doc.get("basics").cloned().unwrap_or_else(|| json!({}));
            let work = doc.get("work").cloned().unwrap_or_else(|| json!([]));
            let mut projected = Map::new();
            projected.insert("basics".to_string(), basics);
            projected.insert("work".to_string(), work);
            Value::Object(projected)
        }
    }
}

/// Returns `work[(n-1)*size .. n*size]`, clamped to the array bounds.
///
/// A page number or size below 1 selects nothing. A missing or non-array
/// `work` behaves like an empty one.
pub fn paginate_work(doc: &Value, page: Page) -> Value {
    let work = doc
        .get("work")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if page.number < 1 || page.size < 1 {
        return json!([]);
    }

    let len = i64::try_from(work.len()).unwrap_or(i64::MAX);
    let start = (page.number - 1).saturating_mul(page.size).min(len);
    let end = start.saturating_add(page.size).min(len);
    // Both bounds lie in 0..=len here.
    let (start, end) = (start as usize, end as usize);
    Value::Array(work[start..end].to_vec())
}

/// Full pipeline. Pagination replaces the payload with the sliced `work`
/// array; everything else in the document is dropped.
pub fn shape_resume(doc: Value, theme: Theme, page: Option<Page>) -> Value {
    let doc = apply_theme(strip_storage_fields(doc), theme);
    match page {
        Some(page) => paginate_work(&doc, page),
        None => doc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_resume() -> Value {
        json!({
            "id": "cv",
            "lang": "en",
            "sections": [{"type": "work"}],
            "count": 3,
            "_rid": "rid",
            "_self": "self",
            "_etag": "etag",
            "_attachments": "attachments/",
            "_ts": 1700000000,
            "basics": {"name": "Ada"},
            "work": (1..=10).map(|i| json!({"company": format!("C{i}")})).collect::<Vec<_>>(),
            "skills": [{"name": "Rust"}]
        })
    }

    fn page(number: i64, size: i64) -> Page {
        Page { number, size }
    }

    #[test]
    fn test_strip_removes_every_storage_field() {
        let doc = strip_storage_fields(stored_resume());
        let map = doc.as_object().unwrap();
        for field in STORAGE_FIELDS {
            assert!(!map.contains_key(field), "{field} survived");
        }
        assert!(map.contains_key("basics"));
        assert!(map.contains_key("work"));
        assert!(map.contains_key("skills"));
    }

    #[test]
    fn test_strip_keeps_nested_fields() {
        let doc = strip_storage_fields(json!({"id": "x", "work": [{"id": 1, "lang": "en"}]}));
        assert_eq!(doc, json!({"work": [{"id": 1, "lang": "en"}]}));
    }

    #[test]
    fn test_minimal_theme_projects_basics_and_work() {
        let doc = apply_theme(strip_storage_fields(stored_resume()), Theme::Minimal);
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["basics", "work"]);
    }

    #[test]
    fn test_minimal_theme_defaults() {
        let doc = apply_theme(json!({"skills": []}), Theme::Minimal);
        assert_eq!(doc, json!({"basics": {}, "work": []}));
    }

    #[test]
    fn test_full_theme_is_identity() {
        let doc = json!({"basics": {}, "extra": 1});
        assert_eq!(apply_theme(doc.clone(), Theme::Full), doc);
    }

    #[test]
    fn test_second_page_of_three() {
        let doc = stored_resume();
        let expected: Vec<Value> = doc["work"].as_array().unwrap()[3..6].to_vec();
        assert_eq!(paginate_work(&doc, page(2, 3)), Value::Array(expected));
    }

    #[test]
    fn test_last_page_is_clamped() {
        let sliced = paginate_work(&stored_resume(), page(4, 3));
        assert_eq!(sliced, json!([{"company": "C10"}]));
    }

    #[test]
    fn test_page_past_end_is_empty() {
        assert_eq!(paginate_work(&stored_resume(), page(5, 3)), json!([]));
        assert_eq!(paginate_work(&stored_resume(), page(i64::MAX, i64::MAX)), json!([]));
    }

    #[test]
    fn test_zero_or_negative_page_is_empty() {
        assert_eq!(paginate_work(&stored_resume(), page(0, 3)), json!([]));
        assert_eq!(paginate_work(&stored_resume(), page(-1, 3)), json!([]));
        assert_eq!(paginate_work(&stored_resume(), page(1, 0)), json!([]));
        assert_eq!(paginate_work(&stored_resume(), page(1, -2)), json!([]));
    }

    #[test]
    fn test_missing_work_paginates_empty() {
        assert_eq!(paginate_work(&json!({"basics": {}}), page(1, 5)), json!([]));
        assert_eq!(paginate_work(&json!({"work": "oops"}), page(1, 5)), json!([]));
    }

    #[test]
    fn test_pipeline_replaces_payload_with_page() {
        let shaped = shape_resume(stored_resume(), Theme::Full, Some(page(1, 2)));
        assert_eq!(shaped, json!([{"company": "C1"}, {"company": "C2"}]));
    }

    #[test]
    fn test_pipeline_without_page() {
        let shaped = shape_resume(stored_resume(), Theme::Minimal, None);
        assert_eq!(shaped["basics"], json!({"name": "Ada"}));
        assert_eq!(shaped["work"].as_array().unwrap().len(), 10);
        assert!(shaped.get("skills").is_none());
    }
}
