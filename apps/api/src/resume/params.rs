use crate::errors::AppError;

/// Query-string parameters of the résumé endpoint.
/// Empty values count as absent, so `?id=&lang=en` is treated like `?lang=en`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeParams {
    pub id: Option<String>,
    pub lang: Option<String>,
    pub filter: Option<String>,
    pub theme: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Full,
    /// Only `basics` and `work`.
    Minimal,
}

/// A requested page of the `work` array. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl ResumeParams {
    /// Builds params from raw key/value pairs. The first occurrence of a key
    /// wins; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = ResumeParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "id" => &mut params.id,
                "lang" => &mut params.lang,
                "filter" => &mut params.filter,
                "theme" => &mut params.theme,
                "page" => &mut params.page,
                "page_size" => &mut params.page_size,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// `(id, lang)` when both are present; `None` selects the landing page.
    pub fn identity(&self) -> Option<(&str, &str)> {
        Some((present(&self.id)?, present(&self.lang)?))
    }

    pub fn filter(&self) -> Option<&str> {
        present(&self.filter)
    }

    pub fn theme(&self) -> Theme {
        match present(&self.theme) {
            Some("minimal") => Theme::Minimal,
            _ => Theme::Full,
        }
    }

    /// The requested page, parsed only when both `page` and `page_size` are given.
    pub fn pagination(&self) -> Result<Option<Page>, AppError> {
        let (Some(page), Some(size)) = (present(&self.page), present(&self.page_size)) else {
            return Ok(None);
        };
        Ok(Some(Page {
            number: parse_int(page)?,
            size: parse_int(size)?,
        }))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_int(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| AppError::InvalidParameter(format!("'{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ResumeParams {
        ResumeParams::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_identity_requires_id_and_lang() {
        assert_eq!(params(&[("id", "cv"), ("lang", "en")]).identity(), Some(("cv", "en")));
        assert_eq!(params(&[("id", "cv")]).identity(), None);
        assert_eq!(params(&[("lang", "en")]).identity(), None);
        assert_eq!(params(&[]).identity(), None);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let p = params(&[("id", ""), ("lang", "en"), ("filter", ""), ("page", ""), ("page_size", "3")]);
        assert_eq!(p.identity(), None);
        assert_eq!(p.filter(), None);
        assert_eq!(p.pagination().unwrap(), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let p = params(&[("id", "first"), ("id", "second"), ("lang", "en")]);
        assert_eq!(p.identity(), Some(("first", "en")));
    }

    #[test]
    fn test_theme() {
        assert_eq!(params(&[("theme", "minimal")]).theme(), Theme::Minimal);
        assert_eq!(params(&[("theme", "MINIMAL")]).theme(), Theme::Full);
        assert_eq!(params(&[("theme", "dark")]).theme(), Theme::Full);
        assert_eq!(params(&[]).theme(), Theme::Full);
    }

    #[test]
    fn test_pagination_needs_both_values() {
        assert_eq!(params(&[("page", "2")]).pagination().unwrap(), None);
        assert_eq!(params(&[("page_size", "2")]).pagination().unwrap(), None);
        assert_eq!(
            params(&[("page", "2"), ("page_size", "3")]).pagination().unwrap(),
            Some(Page { number: 2, size: 3 })
        );
    }

    #[test]
    fn test_pagination_tolerates_whitespace_and_sign() {
        assert_eq!(
            params(&[("page", " 2 "), ("page_size", "+3")]).pagination().unwrap(),
            Some(Page { number: 2, size: 3 })
        );
        assert_eq!(
            params(&[("page", "-1"), ("page_size", "3")]).pagination().unwrap(),
            Some(Page { number: -1, size: 3 })
        );
    }

    #[test]
    fn test_pagination_rejects_non_integers() {
        for (page, size) in [("abc", "3"), ("2", "x"), ("1.5", "3"), ("2", "99999999999999999999")] {
            let err = params(&[("page", page), ("page_size", size)])
                .pagination()
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidParameter(_)), "{page}/{size}");
        }
    }
}
