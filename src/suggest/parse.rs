//! Cleanup of model output before JSON parsing.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::SuggestError;

#[allow(clippy::expect_used)]
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```json|```").expect("code fence regex must compile"));

/// Removes Markdown code-fence markers and surrounding whitespace.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Parses model output as a JSON array of `T`.
///
/// Code fences are stripped first. When prose surrounds the array, the span
/// from the first `[` to the last `]` is tried. Elements that don't decode as
/// `T` are skipped.
///
/// # Errors
///
/// Returns [`SuggestError::Parse`] when no JSON array can be read.
pub fn parse_suggestion_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, SuggestError> {
    let cleaned = strip_code_fences(text);
    let items = match serde_json::from_str::<Vec<Value>>(&cleaned) {
        Ok(items) => items,
        Err(first_err) => {
            let span = cleaned
                .find('[')
                .zip(cleaned.rfind(']'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &cleaned[start..=end]);
            match span {
                Some(span) => serde_json::from_str::<Vec<Value>>(span)
                    .map_err(|e| SuggestError::Parse(e.to_string()))?,
                None => return Err(SuggestError::Parse(first_err.to_string())),
            }
        }
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if parsed.len() < total {
        debug!(skipped = total - parsed.len(), "skipped malformed suggestions");
    }
    Ok(parsed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::suggest::{AuthorSuggestion, BookSuggestion};

    #[test]
    fn test_strip_code_fences_removes_json_fence() {
        let text = "```json\n[{\"title\": \"Dune\"}]\n```";
        assert_eq!(strip_code_fences(text), "[{\"title\": \"Dune\"}]");
    }

    #[test]
    fn test_strip_code_fences_is_case_insensitive() {
        assert_eq!(strip_code_fences("```JSON\n[]\n```  "), "[]");
    }

    #[test]
    fn test_parse_fenced_book_suggestions() {
        let text = "```json\n[{\"title\": \"Dune\", \"author\": \"Herbert\", \"reason\": \"Desert epic\"}]\n```";
        let books: Vec<BookSuggestion> = parse_suggestion_array(text).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[0].author.as_deref(), Some("Herbert"));
        assert_eq!(books[0].reason.as_deref(), Some("Desert epic"));
    }

    #[test]
    fn test_parse_array_surrounded_by_prose() {
        let text = "Here you go:\n[{\"name\": \"N. K. Jemisin\"}]\nEnjoy!";
        let authors: Vec<AuthorSuggestion> = parse_suggestion_array(text).unwrap();
        assert_eq!(authors[0].name, "N. K. Jemisin");
        assert_eq!(authors[0].reason, None);
    }

    #[test]
    fn test_parse_skips_malformed_elements() {
        let text = r#"[{"title": "Dune"}, "just a string", {"title": 42}]"#;
        let books: Vec<BookSuggestion> = parse_suggestion_array(text).unwrap();
        assert_eq!(books.len(), 1);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_suggestion_array::<BookSuggestion>("I cannot help with that.").unwrap_err();
        assert!(matches!(err, SuggestError::Parse(_)));
    }
}
