//! Error types for catalog operations.
//!
//! Follows the What/Why/Fix message pattern used across the project.

use thiserror::Error;

/// Errors that can occur while talking to the catalog service.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The request never produced an HTTP response.
    #[error("catalog request to {endpoint} failed: {message}\n  Suggestion: Check your network connection")]
    Request {
        /// Endpoint path that was called.
        endpoint: String,
        /// Transport error text.
        message: String,
    },

    /// The catalog answered with a non-success status.
    #[error("catalog returned HTTP {status} for {endpoint}: {reason}")]
    Status {
        /// Endpoint path that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Human-readable interpretation of the status.
        reason: String,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected catalog response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path that was called.
        endpoint: String,
        /// Decoder message.
        message: String,
    },

    /// A work/author key could not be turned into a request path.
    #[error("invalid catalog key '{key}': {reason}\n  Suggestion: Use keys like '/works/OL45883W' or 'OL23919A'")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// HTTP client or URL construction failed.
    #[error("catalog client setup failed: {0}")]
    Client(String),
}

impl CatalogError {
    pub(crate) fn status(endpoint: &str, status: u16) -> Self {
        let reason = match status {
            404 => "resource not found in catalog".to_string(),
            429 => "catalog rate limit exceeded, try again in a few seconds".to_string(),
            s if s >= 500 => "catalog unavailable, try again later".to_string(),
            s => format!("catalog returned HTTP {s}"),
        };
        Self::Status {
            endpoint: endpoint.to_string(),
            status,
            reason,
        }
    }

    pub(crate) fn invalid_key(key: &str, reason: &str) -> Self {
        Self::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for a 404 answer.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}
