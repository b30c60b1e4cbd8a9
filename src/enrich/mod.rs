//! Candidate enrichment.
//!
//! Each candidate gets its best edition, resolved author records and a cover
//! URL, then is merged into one sanitized queue document. Candidates are
//! processed concurrently and independently: a candidate that fails is
//! dropped or degraded without affecting the others.

mod sanitize;

pub use sanitize::sanitize_document;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

use crate::catalog::{AuthorRef, Catalog, RawEdition};
use crate::cover::CoverLookup;
use crate::edition::{edition_year, select_best_edition};
use crate::sourcing::Candidate;
use crate::store::{DocValue, Document, QueueDocument, RESERVED_KEY_PREFIX};

/// Default bound on a single cover lookup.
pub const DEFAULT_COVER_TIMEOUT: Duration = Duration::from_secs(3);

/// Tunables for enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentSettings {
    pub cover_timeout: Duration,
    pub reserved_prefix: String,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            cover_timeout: DEFAULT_COVER_TIMEOUT,
            reserved_prefix: RESERVED_KEY_PREFIX.to_string(),
        }
    }
}

/// Resolves editions, authors and covers for candidates.
pub struct EnrichmentOrchestrator {
    catalog: Arc<dyn Catalog>,
    covers: Option<Arc<dyn CoverLookup>>,
    settings: EnrichmentSettings,
}

impl EnrichmentOrchestrator {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        covers: Option<Arc<dyn CoverLookup>>,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            catalog,
            covers,
            settings,
        }
    }

    /// Enriches every candidate concurrently; output order is unspecified.
    pub async fn enrich_all(&self, candidates: Vec<Candidate>) -> Vec<QueueDocument> {
        let total = candidates.len();
        let enriched: Vec<QueueDocument> = join_all(
            candidates
                .into_iter()
                .map(|candidate| self.enrich_one(candidate)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();
        debug!(total, enriched = enriched.len(), "Enrichment finished");
        enriched
    }

    /// Enriches one candidate; `None` when it has no qualifying edition.
    #[instrument(skip(self, candidate), fields(work_key = %candidate.work_key))]
    pub async fn enrich_one(&self, candidate: Candidate) -> Option<QueueDocument> {
        let editions = match self.catalog.work_editions(&candidate.work_key).await {
            Ok(editions) => editions,
            Err(e) => {
                warn!(error = %e, "Edition lookup failed, dropping candidate");
                return None;
            }
        };
        let Some(edition) = select_best_edition(&editions).cloned() else {
            debug!(editions = editions.len(), "No qualifying edition, dropping candidate");
            return None;
        };

        let authors = self.resolve_authors(&candidate.authors).await;
        let primary_author = authors.iter().find_map(|a| a.name.clone());
        let cover_url = self.lookup_cover(&candidate.title, primary_author.as_deref()).await;

        let doc = merge_document(&candidate, &edition, &authors, cover_url);
        Some(QueueDocument {
            doc_id: candidate.doc_id().to_string(),
            work_key: candidate.work_key.clone(),
            record: sanitize_document(doc, &self.settings.reserved_prefix),
        })
    }

    async fn resolve_authors(&self, references: &[AuthorRef]) -> Vec<AuthorRef> {
        join_all(references.iter().map(|reference| async move {
            let Some(key) = reference.key.as_deref() else {
                return reference.clone();
            };
            match self.catalog.author(key).await {
                Ok(detail) => AuthorRef {
                    name: detail
                        .display_name()
                        .map(str::to_string)
                        .or_else(|| reference.name.clone()),
                    key: Some(detail.key),
                },
                Err(e) => {
                    debug!(author_key = key, error = %e, "Author lookup failed, keeping reference");
                    reference.clone()
                }
            }
        }))
        .await
    }

    async fn lookup_cover(&self, title: &str, author: Option<&str>) -> Option<String> {
        let covers = self.covers.as_ref()?;
        match tokio::time::timeout(self.settings.cover_timeout, covers.cover_url(title, author))
            .await
        {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                debug!(error = %e, "Cover lookup failed");
                None
            }
            Err(_) => {
                debug!(timeout = ?self.settings.cover_timeout, "Cover lookup timed out");
                None
            }
        }
    }
}

fn author_entry(author: &AuthorRef) -> DocValue {
    let mut entry = Document::new();
    entry.insert("key".to_string(), author.key.clone().into());
    entry.insert("name".to_string(), author.name.clone().into());
    DocValue::Map(entry)
}

fn non_empty(list: &[String]) -> DocValue {
    if list.is_empty() {
        DocValue::Undefined
    } else {
        DocValue::from(list.to_vec())
    }
}

// Fields every queue entry carries default to "" rather than being dropped.
fn text_or_empty(value: Option<&str>) -> DocValue {
    DocValue::from(value.unwrap_or_default().to_string())
}

/// Merges candidate, edition and enrichment fields into one document.
pub(crate) fn merge_document(
    candidate: &Candidate,
    edition: &RawEdition,
    authors: &[AuthorRef],
    cover_url: Option<String>,
) -> Document {
    let cover_id = candidate
        .cover_id
        .filter(|id| *id > 0)
        .or_else(|| edition.covers.iter().copied().find(|id| *id > 0));
    let languages: Vec<String> = edition.languages.iter().map(|l| l.key.clone()).collect();
    let first_publish_year = candidate.first_publish_year.or_else(|| edition_year(edition));

    let mut doc = Document::new();
    let mut put = |key: &str, value: DocValue| {
        doc.insert(key.to_string(), value);
    };
    put("workKey", candidate.work_key.clone().into());
    put("title", candidate.title.clone().into());
    put("authors", DocValue::List(authors.iter().map(author_entry).collect()));
    put("isbn13", edition.isbn_13.clone().into());
    put("coverId", cover_id.into());
    put("languages", languages.into());
    put("subtitle", text_or_empty(edition.subtitle.as_deref()));
    put("publishedDate", text_or_empty(edition.publish_date.as_deref()));
    put("publisher", edition.publishers.clone().into());
    put("subjects", candidate.subjects.clone().into());
    put("editionSubjects", non_empty(&edition.subjects));
    put("editionKey", edition.key.clone().into());
    put("pagination", text_or_empty(edition.pagination.as_deref()));
    put("numberOfPages", edition.number_of_pages.into());
    put("description", candidate.description.clone().into());
    put("firstPublishYear", first_publish_year.into());
    put("reason", candidate.reason.clone().into());
    put("source", candidate.source.as_str().into());
    put("discoveredAt", candidate.discovered_at.clone().into());
    put(
        "bookshop_cover_url",
        cover_url.map_or(DocValue::Null, DocValue::from),
    );
    doc
}
