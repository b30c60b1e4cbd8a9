//! Error types for the suggestion service.

use thiserror::Error;

/// Errors from the generative suggestion service.
#[derive(Debug, Clone, Error)]
pub enum SuggestError {
    /// The request never produced an HTTP response.
    #[error("suggestion request failed: {0}\n  Suggestion: Check your network connection")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("suggestion service returned HTTP {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Interpretation of the status.
        reason: String,
    },

    /// The response envelope could not be read or carried no text.
    #[error("unexpected suggestion service response: {0}")]
    Response(String),

    /// The model's text was not a JSON array.
    #[error("model output is not a JSON array: {0}")]
    Parse(String),

    /// HTTP client construction failed.
    #[error("suggestion client setup failed: {0}")]
    Client(String),
}

impl SuggestError {
    pub(crate) fn status(status: u16) -> Self {
        let reason = match status {
            400 => "request rejected, check the model name".to_string(),
            401 | 403 => {
                "API key rejected\n  Suggestion: Set GOOGLE_API_KEY or --suggest-api-key".to_string()
            }
            429 => "quota exceeded, try again later".to_string(),
            s if s >= 500 => "service unavailable, try again later".to_string(),
            s => format!("HTTP {s}"),
        };
        Self::Status { status, reason }
    }
}
