//! Cover-image lookup service.
//!
//! The service takes a title and author and answers with an image URL, or 404
//! when it has nothing. Callers bound each lookup with their own timeout.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{HttpSettings, build_http_client};

/// Errors from the cover lookup service.
#[derive(Debug, Clone, Error)]
pub enum CoverError {
    #[error("cover lookup request failed: {0}")]
    Request(String),

    #[error("cover service returned HTTP {0}")]
    Status(u16),

    #[error("unexpected cover service response: {0}")]
    Response(String),

    #[error("cover client setup failed: {0}")]
    Client(String),
}

/// Title/author to cover-image URL lookup.
#[async_trait]
pub trait CoverLookup: Send + Sync {
    /// Returns the cover URL, or `None` when the service has no cover.
    async fn cover_url(&self, title: &str, author: Option<&str>)
    -> Result<Option<String>, CoverError>;
}

#[derive(Debug, Serialize)]
struct CoverRequest<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverResponse {
    #[serde(default)]
    cover_url: Option<String>,
}

/// HTTP client for a `POST /cover` lookup service.
pub struct CoverServiceClient {
    client: Client,
    base_url: String,
}

impl CoverServiceClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CoverError::Client`] if HTTP client construction fails.
    pub fn new(settings: &HttpSettings, base_url: impl Into<String>) -> Result<Self, CoverError> {
        let client = build_http_client(settings).map_err(|e| CoverError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl std::fmt::Debug for CoverServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverServiceClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CoverLookup for CoverServiceClient {
    #[tracing::instrument(skip(self), fields(service = "cover"))]
    async fn cover_url(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> Result<Option<String>, CoverError> {
        let response = self
            .client
            .post(format!("{}/cover", self.base_url))
            .json(&CoverRequest { title, author })
            .send()
            .await
            .map_err(|e| CoverError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("No cover found");
                Ok(None)
            }
            status if status.is_success() => {
                let body: CoverResponse = response
                    .json()
                    .await
                    .map_err(|e| CoverError::Response(e.to_string()))?;
                Ok(body.cover_url.filter(|url| !url.trim().is_empty()))
            }
            status => Err(CoverError::Status(status.as_u16())),
        }
    }
}
