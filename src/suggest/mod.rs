//! Generative suggestion service.
//!
//! # Overview
//!
//! - [`SuggestionService`] - Async contract: liked titles/authors in, suggestions out
//! - [`GeminiClient`] - Gemini `generateContent` implementation
//! - [`strip_code_fences`] / [`parse_suggestion_array`] - Model output cleanup

mod error;
mod gemini;
mod parse;

pub use error::SuggestError;
pub use gemini::{DEFAULT_SUGGESTION_BASE_URL, DEFAULT_SUGGESTION_MODEL, GeminiClient};
pub use parse::{parse_suggestion_array, strip_code_fences};

use async_trait::async_trait;
use serde::Deserialize;

/// Maximum book suggestions requested per run.
pub const MAX_BOOK_SUGGESTIONS: usize = 10;
/// Maximum author suggestions requested per profiler run.
pub const MAX_AUTHOR_SUGGESTIONS: usize = 5;

/// A suggested book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookSuggestion {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A suggested author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorSuggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Prompt-in, structured-suggestions-out service.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Suggests up to `limit` books for a reader who liked `liked_titles`.
    async fn suggest_books(
        &self,
        liked_titles: &[String],
        limit: usize,
    ) -> Result<Vec<BookSuggestion>, SuggestError>;

    /// Suggests up to `limit` authors given liked authors and favourite subjects.
    async fn suggest_authors(
        &self,
        liked_authors: &[String],
        subjects: &[String],
        limit: usize,
    ) -> Result<Vec<AuthorSuggestion>, SuggestError>;
}

pub(crate) fn book_prompt(liked_titles: &[String], limit: usize) -> String {
    format!(
        "A reader recently liked these books: {}. Suggest {limit} other books they might enjoy. \
         Answer only with a JSON array of objects with 'title', 'author' and 'reason'.",
        liked_titles.join("; ")
    )
}

pub(crate) fn author_prompt(liked_authors: &[String], subjects: &[String], limit: usize) -> String {
    format!(
        "A user has liked authors: {}. Their favourite book subjects are: {}. \
         Suggest {limit} more authors they might enjoy, as a JSON array of objects with 'name' and (if possible) 'reason'.",
        liked_authors.join(", "),
        subjects.join(", ")
    )
}
