//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::parse::parse_suggestion_array;
use super::{
    AuthorSuggestion, BookSuggestion, SuggestError, SuggestionService, author_prompt, book_prompt,
};
use crate::catalog::{HttpSettings, build_http_client};

/// Default Generative Language API base URL.
pub const DEFAULT_SUGGESTION_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default model.
pub const DEFAULT_SUGGESTION_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
}

#[derive(Debug, Deserialize)]
struct GenerateCandidate {
    #[serde(default)]
    content: Option<GenerateContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContent {
    #[serde(default)]
    parts: Vec<GeneratePart>,
}

#[derive(Debug, Deserialize)]
struct GeneratePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini-backed [`SuggestionService`].
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Creates a client for the public Gemini API.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::Client`] if HTTP client construction fails.
    pub fn new(settings: &HttpSettings, api_key: impl Into<String>) -> Result<Self, SuggestError> {
        Self::with_base_url(
            settings,
            api_key,
            DEFAULT_SUGGESTION_MODEL,
            DEFAULT_SUGGESTION_BASE_URL,
        )
    }

    /// Creates a client with a custom model and base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::Client`] if the API key is empty or the HTTP
    /// client cannot be built.
    pub fn with_base_url(
        settings: &HttpSettings,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SuggestError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SuggestError::Client("API key is empty".to_string()));
        }
        let client = build_http_client(settings).map_err(|e| SuggestError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, SuggestError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"responseMimeType": "application/json"}
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Suggestion request failed");
                SuggestError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Suggestion service error");
            return Err(SuggestError::status(status.as_u16()));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SuggestError::Response(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect();
        if text.trim().is_empty() {
            return Err(SuggestError::Response("no text in response".to_string()));
        }
        Ok(text)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SuggestionService for GeminiClient {
    async fn suggest_books(
        &self,
        liked_titles: &[String],
        limit: usize,
    ) -> Result<Vec<BookSuggestion>, SuggestError> {
        let text = self.generate(&book_prompt(liked_titles, limit)).await?;
        let mut books: Vec<BookSuggestion> = parse_suggestion_array(&text)?;
        books.truncate(limit);
        debug!(count = books.len(), "Parsed book suggestions");
        Ok(books)
    }

    async fn suggest_authors(
        &self,
        liked_authors: &[String],
        subjects: &[String],
        limit: usize,
    ) -> Result<Vec<AuthorSuggestion>, SuggestError> {
        let text = self
            .generate(&author_prompt(liked_authors, subjects, limit))
            .await?;
        let mut authors: Vec<AuthorSuggestion> = parse_suggestion_array(&text)?;
        authors.truncate(limit);
        Ok(authors)
    }
}
