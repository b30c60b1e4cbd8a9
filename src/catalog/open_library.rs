//! Open Library client.
//!
//! Calls the public JSON endpoints under `https://openlibrary.org`. The base
//! URL is injectable so tests can point the client at a wiremock server.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::error::CatalogError;
use super::http_client::{HttpSettings, build_http_client};
use super::types::{
    AuthorDetail, AuthorSearchDoc, BookSearch, RawEdition, RawEditionsResponse,
    RawSearchResponse, RawSubjectResponse, RawTrendingResponse, SearchDoc, SubjectPage,
    SubjectWork, TrendingWork, WorkDetail, decode_lenient,
};
use super::Catalog;

/// Default Open Library base URL.
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://openlibrary.org";

/// Editions requested per work.
const EDITIONS_LIMIT: u32 = 50;

/// Open Library implementation of [`Catalog`].
pub struct OpenLibraryClient {
    client: Client,
    base_url: String,
}

impl OpenLibraryClient {
    /// Creates a client for the public Open Library API.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Client`] if HTTP client construction fails.
    pub fn new(settings: &HttpSettings) -> Result<Self, CatalogError> {
        Self::with_base_url(settings, DEFAULT_CATALOG_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Client`] if the base URL is not absolute or the
    /// HTTP client cannot be built.
    #[tracing::instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn with_base_url(
        settings: &HttpSettings,
        base_url: impl AsRef<str>,
    ) -> Result<Self, CatalogError> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| CatalogError::Client(format!("invalid base URL '{base_url}': {e}")))?;
        let client = build_http_client(settings).map_err(|e| CatalogError::Client(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| CatalogError::Client(format!("invalid endpoint '{path}': {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let endpoint = url.path().to_string();
        debug!(api_url = %url, "Calling catalog API");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, %endpoint, "Catalog request failed");
            CatalogError::Request {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), %endpoint, "Catalog API error");
            return Err(CatalogError::status(&endpoint, status.as_u16()));
        }

        response.json::<T>().await.map_err(|e| {
            warn!(error = %e, %endpoint, "Failed to parse catalog response JSON");
            CatalogError::Decode {
                endpoint,
                message: e.to_string(),
            }
        })
    }
}

impl std::fmt::Debug for OpenLibraryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenLibraryClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Normalizes a catalog key to its absolute path form.
///
/// Accepts `/works/OL45883W`, `works/OL45883W` or the bare `OL45883W` and
/// returns `/works/OL45883W` for `kind = "works"`.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidKey`] when the id is empty, belongs to
/// another kind, or contains characters outside `[A-Za-z0-9_-]`.
pub fn normalize_key(kind: &str, key: &str) -> Result<String, CatalogError> {
    let trimmed = key.trim().trim_start_matches('/');
    let id = match trimmed.split_once('/') {
        Some((prefix, rest)) if prefix == kind => rest,
        Some(_) => return Err(CatalogError::invalid_key(key, &format!("not a {kind} key"))),
        None => trimmed,
    };
    if id.is_empty() {
        return Err(CatalogError::invalid_key(key, "missing identifier"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CatalogError::invalid_key(key, "unexpected characters"));
    }
    Ok(format!("/{kind}/{id}"))
}

#[async_trait]
impl Catalog for OpenLibraryClient {
    #[tracing::instrument(skip(self), fields(catalog = "open_library"))]
    async fn subject_work_count(&self, subject: &str) -> Result<u64, CatalogError> {
        let mut url = self.endpoint(&format!("/subjects/{}.json", urlencoding::encode(subject)))?;
        url.query_pairs_mut()
            .append_pair("details", "true")
            .append_pair("limit", "0");
        let body: RawSubjectResponse = self.get_json(url).await?;
        Ok(body.work_count)
    }

    #[tracing::instrument(skip(self), fields(catalog = "open_library"))]
    async fn subject_works(
        &self,
        subject: &str,
        offset: u64,
        limit: u32,
    ) -> Result<SubjectPage, CatalogError> {
        let mut url = self.endpoint(&format!("/subjects/{}.json", urlencoding::encode(subject)))?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());
        let body: RawSubjectResponse = self.get_json(url).await?;
        let works: Vec<SubjectWork> = decode_lenient(body.works, "subject works");
        Ok(SubjectPage {
            work_count: body.work_count,
            works,
        })
    }

    #[tracing::instrument(skip(self), fields(catalog = "open_library"))]
    async fn work_editions(&self, work_key: &str) -> Result<Vec<RawEdition>, CatalogError> {
        let work_path = normalize_key("works", work_key)?;
        let mut url = self.endpoint(&format!("{work_path}/editions.json"))?;
        url.query_pairs_mut()
            .append_pair("limit", &EDITIONS_LIMIT.to_string());
        let body: RawEditionsResponse = self.get_json(url).await?;
        Ok(decode_lenient(body.entries, "editions"))
    }

    #[tracing::instrument(skip(self), fields(catalog = "open_library"))]
    async fn author(&self, author_key: &str) -> Result<AuthorDetail, CatalogError> {
        let author_path = normalize_key("authors", author_key)?;
        let url = self.endpoint(&format!("{author_path}.json"))?;
        self.get_json(url).await
    }

    #[tracing::instrument(skip(self), fields(catalog = "open_library", title = %query.title))]
    async fn search_books(&self, query: &BookSearch) -> Result<Vec<SearchDoc>, CatalogError> {
        let mut url = self.endpoint("/search.json")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("title", &query.title);
            if let Some(author) = &query.author {
                pairs.append_pair("author", author);
            }
            if let Some(language) = &query.language {
                pairs.append_pair("language", language);
            }
            pairs.append_pair("limit", &query.limit.to_string());
        }
        let body: RawSearchResponse = self.get_json(url).await?;
        Ok(decode_lenient(body.docs, "search results"))
    }

    #[tracing::instrument(skip(self), fields(catalog = "open_library"))]
    async fn search_authors(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Vec<AuthorSearchDoc>, CatalogError> {
        let mut url = self.endpoint("/search/authors.json")?;
        url.query_pairs_mut()
            .append_pair("q", name)
            .append_pair("limit", &limit.to_string());
        let body: RawSearchResponse = self.get_json(url).await?;
        Ok(decode_lenient(body.docs, "author results"))
    }

    #[tracing::instrument(skip(self), fields(catalog = "open_library"))]
    async fn work(&self, work_key: &str) -> Result<WorkDetail, CatalogError> {
        let work_path = normalize_key("works", work_key)?;
        let url = self.endpoint(&format!("{work_path}.json"))?;
        self.get_json(url).await
    }

    #[tracing::instrument(skip(self), fields(catalog = "open_library"))]
    async fn trending_yearly(&self, limit: u32) -> Result<Vec<TrendingWork>, CatalogError> {
        let mut url = self.endpoint("/trending/yearly.json")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let body: RawTrendingResponse = self.get_json(url).await?;
        Ok(decode_lenient(body.works, "trending works"))
    }
}
