//! Catalog response shapes.
//!
//! Every optional field carries `#[serde(default)]` so a sparse record decodes
//! with absent values instead of failing. List payloads are decoded one entry
//! at a time via [`decode_lenient`]; entries that don't match are skipped.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Text that the catalog serves either as a plain string or as `{type, value}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Plain(String),
    Typed { value: String },
}

impl TextValue {
    /// Returns the inner text regardless of representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Typed { value: text } => text,
        }
    }
}

/// Author reference carried on works and subject listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorRef {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Language reference carried on editions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageRef {
    pub key: String,
}

/// A work entry from a subject listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectWork {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<AuthorRef>,
    #[serde(default)]
    pub subject: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub cover_id: Option<i64>,
}

/// One page of a subject listing.
#[derive(Debug, Clone, Default)]
pub struct SubjectPage {
    pub work_count: u64,
    pub works: Vec<SubjectWork>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSubjectResponse {
    #[serde(default)]
    pub work_count: u64,
    #[serde(default)]
    pub works: Vec<Value>,
}

/// Raw edition record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEdition {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub isbn_13: Vec<String>,
    #[serde(default)]
    pub languages: Vec<LanguageRef>,
    #[serde(default)]
    pub covers: Vec<i64>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub number_of_pages: Option<u32>,
    #[serde(default)]
    pub pagination: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEditionsResponse {
    #[serde(default)]
    pub entries: Vec<Value>,
}

/// Author detail record.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorDetail {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub personal_name: Option<String>,
}

impl AuthorDetail {
    /// Best display name available.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.personal_name.as_deref())
    }
}

/// Work detail record.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkDetail {
    pub key: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub description: Option<TextValue>,
}

/// A title/author search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSearch {
    pub title: String,
    pub author: Option<String>,
    pub language: Option<String>,
    pub limit: u32,
}

impl BookSearch {
    /// English-language search for a title, optionally narrowed by author.
    #[must_use]
    pub fn english(title: &str, author: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            author: author.map(str::to_string),
            language: Some("eng".to_string()),
            limit: 10,
        }
    }
}

/// A document from the book search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub author_key: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub cover_i: Option<i64>,
    #[serde(default)]
    pub subject: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchResponse {
    #[serde(default)]
    pub docs: Vec<Value>,
}

/// A document from the author search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorSearchDoc {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub top_work: Option<String>,
    #[serde(default)]
    pub work_count: Option<u64>,
}

/// A work from the yearly trending list.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendingWork {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub author_key: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub cover_i: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrendingResponse {
    #[serde(default)]
    pub works: Vec<Value>,
}

/// Decodes each element independently, skipping the ones that don't fit `T`.
pub(crate) fn decode_lenient<T: DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if decoded.len() < total {
        debug!(
            what,
            skipped = total - decoded.len(),
            "skipped malformed catalog entries"
        );
    }
    decoded
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_value_accepts_both_shapes() {
        let plain: TextValue = serde_json::from_value(json!("A desert planet")).unwrap();
        let typed: TextValue =
            serde_json::from_value(json!({"type": "/type/text", "value": "A desert planet"}))
                .unwrap();
        assert_eq!(plain.as_str(), "A desert planet");
        assert_eq!(typed.as_str(), "A desert planet");
    }

    #[test]
    fn test_raw_edition_missing_fields_are_absent() {
        let edition: RawEdition = serde_json::from_value(json!({"title": "Dune"})).unwrap();
        assert!(edition.isbn_13.is_empty());
        assert!(edition.languages.is_empty());
        assert!(edition.covers.is_empty());
        assert_eq!(edition.publish_date, None);
    }

    #[test]
    fn test_decode_lenient_skips_malformed_entries() {
        let entries = vec![
            json!({"isbn_13": ["9780441172719"]}),
            json!({"isbn_13": "not-a-list"}),
            json!({"covers": [1, 2]}),
        ];
        let editions: Vec<RawEdition> = decode_lenient(entries, "editions");
        assert_eq!(editions.len(), 2);
        assert_eq!(editions[0].isbn_13, vec!["9780441172719".to_string()]);
        assert_eq!(editions[1].covers, vec![1, 2]);
    }

    #[test]
    fn test_author_detail_display_name_falls_back() {
        let author: AuthorDetail =
            serde_json::from_value(json!({"key": "/authors/OL1A", "personal_name": "F. Herbert"}))
                .unwrap();
        assert_eq!(author.display_name(), Some("F. Herbert"));
    }
}
