use serde_json::json;

use crate::store::DocumentQuery;

/// Selects the résumé stored under `id` in language `lang`. With a `filter`,
/// only documents whose `sections` hold an entry of that `type` match.
pub fn build_resume_query(id: &str, lang: &str, filter: Option<&str>) -> DocumentQuery {
    let query = DocumentQuery::new()
        .field_equals("id", id)
        .field_equals("lang", lang);
    match filter {
        Some(section_type) => query.array_contains("sections", json!({ "type": section_type })),
        None => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Condition;

    #[test]
    fn test_id_and_lang_only() {
        let q = build_resume_query("cv", "en", None);
        assert_eq!(
            q.conditions,
            vec![
                Condition::FieldEquals { field: "id".into(), value: "cv".into() },
                Condition::FieldEquals { field: "lang".into(), value: "en".into() },
            ]
        );
    }

    #[test]
    fn test_filter_adds_section_condition() {
        let q = build_resume_query("cv", "en", Some("education"));
        assert_eq!(q.conditions.len(), 3);
        assert_eq!(
            q.conditions[2],
            Condition::ArrayContains {
                field: "sections".into(),
                element: json!({"type": "education"}),
            }
        );
    }

    #[test]
    fn test_filter_narrows_matches() {
        let doc = json!({
            "id": "cv",
            "lang": "en",
            "sections": [{"type": "work"}, {"type": "education"}]
        });
        assert!(build_resume_query("cv", "en", None).matches(&doc));
        assert!(build_resume_query("cv", "en", Some("work")).matches(&doc));
        assert!(!build_resume_query("cv", "en", Some("awards")).matches(&doc));
        assert!(!build_resume_query("cv", "fr", None).matches(&doc));
    }

    #[test]
    fn test_quotes_stay_data() {
        let doc = json!({"id": "cv", "lang": "en"});
        assert!(!build_resume_query("cv' OR '1'='1", "en", None).matches(&doc));
    }
}
