//! In-memory stand-ins for the outbound services.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::{
    AuthorDetail, AuthorSearchDoc, BookSearch, Catalog, CatalogError, LanguageRef, RawEdition,
    SearchDoc, SubjectPage, SubjectWork, TrendingWork, WorkDetail,
};
use crate::cover::{CoverError, CoverLookup};
use crate::edition::ENGLISH_LANGUAGE_KEY;
use crate::suggest::{AuthorSuggestion, BookSuggestion, SuggestError, SuggestionService};

/// Edition that passes the ISBN/English/cover filter.
pub fn english_edition(publish_date: &str) -> RawEdition {
    RawEdition {
        isbn_13: vec!["9780441172719".to_string()],
        languages: vec![LanguageRef {
            key: ENGLISH_LANGUAGE_KEY.to_string(),
        }],
        covers: vec![8_231_856],
        publish_date: Some(publish_date.to_string()),
        publishers: vec!["Ace".to_string()],
        ..RawEdition::default()
    }
}

/// Subject-listing work with one author.
pub fn subject_work(key: &str, title: &str, year: Option<i32>) -> SubjectWork {
    SubjectWork {
        key: key.to_string(),
        title: title.to_string(),
        authors: vec![crate::catalog::AuthorRef {
            key: Some("/authors/OL1A".to_string()),
            name: Some("Frank Herbert".to_string()),
        }],
        subject: vec!["Science fiction".to_string()],
        first_publish_year: year,
        cover_id: Some(1),
    }
}

/// Search result document.
pub fn search_doc(key: &str, title: &str, authors: &[&str]) -> SearchDoc {
    SearchDoc {
        key: key.to_string(),
        title: title.to_string(),
        author_name: authors.iter().map(|a| (*a).to_string()).collect(),
        author_key: Vec::new(),
        first_publish_year: Some(1990),
        cover_i: None,
        subject: Vec::new(),
    }
}

fn missing(path: &str) -> CatalogError {
    CatalogError::status(path, 404)
}

/// Catalog answering from canned data; unknown keys answer 404.
#[derive(Default)]
pub struct FakeCatalog {
    subjects: HashMap<String, (u64, Vec<SubjectWork>)>,
    editions: HashMap<String, Vec<RawEdition>>,
    authors: HashMap<String, AuthorDetail>,
    searches: HashMap<String, Vec<SearchDoc>>,
    author_searches: HashMap<String, Vec<AuthorSearchDoc>>,
    works: HashMap<String, WorkDetail>,
    trending: Vec<TrendingWork>,
    calls: AtomicUsize,
    subject_offsets: Mutex<Vec<(String, u64)>>,
    subject_delay: Option<Duration>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: &str, work_count: u64, works: Vec<SubjectWork>) -> Self {
        self.subjects.insert(subject.to_string(), (work_count, works));
        self
    }

    pub fn with_editions(mut self, work_key: &str, editions: Vec<RawEdition>) -> Self {
        self.editions.insert(work_key.to_string(), editions);
        self
    }

    pub fn with_author(mut self, key: &str, name: &str) -> Self {
        self.authors.insert(
            key.to_string(),
            AuthorDetail {
                key: key.to_string(),
                name: Some(name.to_string()),
                personal_name: None,
            },
        );
        self
    }

    pub fn with_search(mut self, title: &str, docs: Vec<SearchDoc>) -> Self {
        self.searches.insert(title.to_lowercase(), docs);
        self
    }

    pub fn with_author_search(mut self, name: &str, docs: Vec<AuthorSearchDoc>) -> Self {
        self.author_searches.insert(name.to_lowercase(), docs);
        self
    }

    pub fn with_work(mut self, work: WorkDetail) -> Self {
        self.works.insert(work.key.clone(), work);
        self
    }

    pub fn with_trending(mut self, works: Vec<TrendingWork>) -> Self {
        self.trending = works;
        self
    }

    /// Delays every subject count lookup.
    pub fn with_subject_delay(mut self, delay: Duration) -> Self {
        self.subject_delay = Some(delay);
        self
    }

    /// Total calls across every endpoint.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Offsets requested per subject, in call order.
    pub fn subject_offsets(&self) -> Vec<(String, u64)> {
        self.subject_offsets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn subject_work_count(&self, subject: &str) -> Result<u64, CatalogError> {
        self.record();
        if let Some(delay) = self.subject_delay {
            tokio::time::sleep(delay).await;
        }
        self.subjects
            .get(subject)
            .map(|(count, _)| *count)
            .ok_or_else(|| missing(subject))
    }

    async fn subject_works(
        &self,
        subject: &str,
        offset: u64,
        limit: u32,
    ) -> Result<SubjectPage, CatalogError> {
        self.record();
        self.subject_offsets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((subject.to_string(), offset));
        let (work_count, works) = self.subjects.get(subject).ok_or_else(|| missing(subject))?;
        Ok(SubjectPage {
            work_count: *work_count,
            works: works.iter().take(limit as usize).cloned().collect(),
        })
    }

    async fn work_editions(&self, work_key: &str) -> Result<Vec<RawEdition>, CatalogError> {
        self.record();
        self.editions
            .get(work_key)
            .cloned()
            .ok_or_else(|| missing(work_key))
    }

    async fn author(&self, author_key: &str) -> Result<AuthorDetail, CatalogError> {
        self.record();
        self.authors
            .get(author_key)
            .cloned()
            .ok_or_else(|| missing(author_key))
    }

    async fn search_books(&self, query: &BookSearch) -> Result<Vec<SearchDoc>, CatalogError> {
        self.record();
        Ok(self
            .searches
            .get(&query.title.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn search_authors(
        &self,
        name: &str,
        _limit: u32,
    ) -> Result<Vec<AuthorSearchDoc>, CatalogError> {
        self.record();
        Ok(self
            .author_searches
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn work(&self, work_key: &str) -> Result<WorkDetail, CatalogError> {
        self.record();
        self.works.get(work_key).cloned().ok_or_else(|| missing(work_key))
    }

    async fn trending_yearly(&self, limit: u32) -> Result<Vec<TrendingWork>, CatalogError> {
        self.record();
        Ok(self.trending.iter().take(limit as usize).cloned().collect())
    }
}

/// Suggestion service with canned answers.
#[derive(Default)]
pub struct FakeSuggester {
    books: Vec<BookSuggestion>,
    authors: Vec<AuthorSuggestion>,
    fail: bool,
    calls: AtomicUsize,
    last_titles: Mutex<Vec<String>>,
}

impl FakeSuggester {
    pub fn with_books(books: Vec<BookSuggestion>) -> Self {
        Self {
            books,
            ..Self::default()
        }
    }

    pub fn with_authors(authors: Vec<AuthorSuggestion>) -> Self {
        Self {
            authors,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Liked titles passed to the last book request.
    pub fn last_titles(&self) -> Vec<String> {
        self.last_titles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SuggestionService for FakeSuggester {
    async fn suggest_books(
        &self,
        liked_titles: &[String],
        limit: usize,
    ) -> Result<Vec<BookSuggestion>, SuggestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_titles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = liked_titles.to_vec();
        if self.fail {
            return Err(SuggestError::status(503));
        }
        Ok(self.books.iter().take(limit).cloned().collect())
    }

    async fn suggest_authors(
        &self,
        _liked_authors: &[String],
        _subjects: &[String],
        limit: usize,
    ) -> Result<Vec<AuthorSuggestion>, SuggestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SuggestError::status(503));
        }
        Ok(self.authors.iter().take(limit).cloned().collect())
    }
}

/// Cover lookup keyed by title, with optional delay or failure.
#[derive(Default)]
pub struct FakeCovers {
    urls: HashMap<String, String>,
    delay: Option<Duration>,
    fail: bool,
}

impl FakeCovers {
    pub fn with_cover(mut self, title: &str, url: &str) -> Self {
        self.urls.insert(title.to_string(), url.to_string());
        self
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CoverLookup for FakeCovers {
    async fn cover_url(
        &self,
        title: &str,
        _author: Option<&str>,
    ) -> Result<Option<String>, CoverError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(CoverError::Status(500));
        }
        Ok(self.urls.get(title).cloned())
    }
}
