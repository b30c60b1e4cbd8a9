//! External book catalog access.
//!
//! # Overview
//!
//! - [`Catalog`] - Async contract for the catalog/search service
//! - [`OpenLibraryClient`] - Open Library implementation over `reqwest`
//! - [`HttpSettings`] - Timeouts and user-agent shared by outbound clients
//! - Response types with lenient decoding of list payloads

mod error;
pub mod http_client;
mod open_library;
mod types;

pub use error::CatalogError;
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpSettings, build_http_client,
};
pub use open_library::{DEFAULT_CATALOG_BASE_URL, OpenLibraryClient, normalize_key};
pub use types::{
    AuthorDetail, AuthorRef, AuthorSearchDoc, BookSearch, LanguageRef, RawEdition, SearchDoc,
    SubjectPage, SubjectWork, TextValue, TrendingWork, WorkDetail,
};

use async_trait::async_trait;

/// Read-only catalog operations used by sourcing, enrichment and profiling.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Total number of works filed under a subject.
    async fn subject_work_count(&self, subject: &str) -> Result<u64, CatalogError>;

    /// One page of works under a subject.
    async fn subject_works(
        &self,
        subject: &str,
        offset: u64,
        limit: u32,
    ) -> Result<SubjectPage, CatalogError>;

    /// Every edition of a work; malformed entries are skipped.
    async fn work_editions(&self, work_key: &str) -> Result<Vec<RawEdition>, CatalogError>;

    /// Author detail record.
    async fn author(&self, author_key: &str) -> Result<AuthorDetail, CatalogError>;

    /// Title/author search.
    async fn search_books(&self, query: &BookSearch) -> Result<Vec<SearchDoc>, CatalogError>;

    /// Author name search.
    async fn search_authors(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Vec<AuthorSearchDoc>, CatalogError>;

    /// Work detail record.
    async fn work(&self, work_key: &str) -> Result<WorkDetail, CatalogError>;

    /// Works trending over the past year.
    async fn trending_yearly(&self, limit: u32) -> Result<Vec<TrendingWork>, CatalogError>;
}
