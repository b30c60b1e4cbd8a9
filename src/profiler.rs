//! Preference profiling from swipe history.
//!
//! Runs whenever a liked-book record is created. Liked history is weighted by
//! recency: with `N` liked records, the newest weighs `N` and the oldest `1`.
//! Disliked subject occurrences subtract one each, but only from subjects the
//! liked history already scored.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::edition::parse_year;
use crate::store::{
    BookStore, Collection, PreferenceUpdate, ShortlistedAuthor, StoreError, StoredBook,
};
use crate::suggest::{MAX_AUTHOR_SUGGESTIONS, SuggestionService};

/// Liked and disliked records read per profiler run.
pub const PROFILE_HISTORY_LIMIT: u32 = 200;
/// Subject keywords kept on the profile.
pub const MAX_SUBJECT_KEYWORDS: usize = 5;
/// Authors taken from like history for the shortlist.
pub const MAX_HISTORY_AUTHORS: usize = 5;

/// Errors that stop a profiler run.
#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A subject with its weighted score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectScore {
    pub subject: String,
    pub score: i64,
}

/// Recency weight of the record at `position` in a newest-first list of `total`.
fn recency_weight(total: usize, position: usize) -> i64 {
    i64::try_from(total - position).unwrap_or(i64::MAX)
}

fn sort_scores<K: Ord + Clone>(scores: HashMap<K, i64>) -> Vec<(K, i64)> {
    let mut ranked: Vec<(K, i64)> = scores.into_iter().collect();
    ranked.sort_by(|(a_key, a_score), (b_key, b_score)| {
        b_score.cmp(a_score).then_with(|| a_key.cmp(b_key))
    });
    ranked
}

/// Scores every liked subject; `liked` must be newest first.
///
/// Sorted by score descending, ties alphabetical.
#[must_use]
pub fn rank_subjects(liked: &[StoredBook], disliked: &[StoredBook]) -> Vec<SubjectScore> {
    let mut scores: HashMap<String, i64> = HashMap::new();
    for (position, book) in liked.iter().enumerate() {
        let weight = recency_weight(liked.len(), position);
        for subject in book.text_list("subjects") {
            *scores.entry(subject.to_string()).or_default() += weight;
        }
    }
    for book in disliked {
        for subject in book.text_list("subjects") {
            if let Some(score) = scores.get_mut(subject) {
                *score -= 1;
            }
        }
    }
    sort_scores(scores)
        .into_iter()
        .map(|(subject, score)| SubjectScore { subject, score })
        .collect()
}

/// Top subjects by weighted score.
#[must_use]
pub fn top_subject_keywords(liked: &[StoredBook], disliked: &[StoredBook]) -> Vec<String> {
    rank_subjects(liked, disliked)
        .into_iter()
        .take(MAX_SUBJECT_KEYWORDS)
        .map(|scored| scored.subject)
        .collect()
}

/// Publication year of a stored book: `firstPublishYear`, else `publishedDate`.
#[must_use]
pub fn book_year(book: &StoredBook) -> Option<i32> {
    book.data
        .get("firstPublishYear")
        .and_then(Value::as_i64)
        .and_then(|year| i32::try_from(year).ok())
        .filter(|year| *year != 0)
        .or_else(|| book.text_field("publishedDate").and_then(parse_year))
}

/// Most common publication decade among liked books, as `"1990s"`.
///
/// Ties go to the later decade; `None` when no book has a usable year.
#[must_use]
pub fn favourite_decade(liked: &[StoredBook]) -> Option<String> {
    let mut buckets: BTreeMap<i32, u32> = BTreeMap::new();
    for year in liked.iter().filter_map(book_year) {
        *buckets.entry(year.div_euclid(10) * 10).or_default() += 1;
    }
    buckets
        .into_iter()
        .max_by_key(|(decade, count)| (*count, *decade))
        .map(|(decade, _)| format!("{decade}s"))
}

/// Authors of liked books ranked by the same recency weights.
#[must_use]
pub fn rank_authors(liked: &[StoredBook]) -> Vec<ShortlistedAuthor> {
    let mut scores: HashMap<String, i64> = HashMap::new();
    let mut display: HashMap<String, (String, Option<String>)> = HashMap::new();
    for (position, book) in liked.iter().enumerate() {
        let weight = recency_weight(liked.len(), position);
        let mut seen_in_book = HashSet::new();
        let authors = book.data.get("authors").and_then(Value::as_array);
        for author in authors.into_iter().flatten() {
            let Some(name) = author.get("name").and_then(Value::as_str) else {
                continue;
            };
            let folded = name.trim().to_lowercase();
            if folded.is_empty() || !seen_in_book.insert(folded.clone()) {
                continue;
            }
            *scores.entry(folded.clone()).or_default() += weight;
            display.entry(folded).or_insert_with(|| {
                let key = author.get("key").and_then(Value::as_str).map(str::to_string);
                (name.trim().to_string(), key)
            });
        }
    }
    sort_scores(scores)
        .into_iter()
        .filter_map(|(folded, _)| display.remove(&folded))
        .map(|(name, key)| ShortlistedAuthor {
            name,
            key,
            ..ShortlistedAuthor::default()
        })
        .collect()
}

fn author_path(key: &str) -> String {
    if key.starts_with("/authors/") {
        key.to_string()
    } else {
        format!("/authors/{}", key.trim_start_matches('/'))
    }
}

/// Derives preference fields from swipe history.
pub struct PreferenceProfiler {
    store: Arc<dyn BookStore>,
    catalog: Arc<dyn Catalog>,
    suggester: Option<Arc<dyn SuggestionService>>,
}

impl PreferenceProfiler {
    #[must_use]
    pub fn new(
        store: Arc<dyn BookStore>,
        catalog: Arc<dyn Catalog>,
        suggester: Option<Arc<dyn SuggestionService>>,
    ) -> Self {
        Self {
            store,
            catalog,
            suggester,
        }
    }

    /// Event entry point; failures are logged, never returned.
    pub async fn on_liked_book_created(&self, user_id: &str) {
        match self.refresh(user_id).await {
            Ok(Some(update)) => info!(
                user_id,
                keywords = ?update.subject_keywords,
                period = ?update.favourite_publishing_period,
                authors = update.shortlisted_authors.len(),
                "Updated preference profile"
            ),
            Ok(None) => debug!(user_id, "No liked books, preference profile unchanged"),
            Err(e) => warn!(user_id, error = %e, "Preference profiling failed"),
        }
    }

    /// Recomputes and stores the preference fields.
    ///
    /// Returns `None` without writing when the user has no liked books.
    ///
    /// # Errors
    ///
    /// Returns [`ProfilerError::Store`] when history can't be read or the
    /// profile update fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: &str) -> Result<Option<PreferenceUpdate>, ProfilerError> {
        let liked = self
            .store
            .recent_books(user_id, Collection::Liked, PROFILE_HISTORY_LIMIT)
            .await?;
        if liked.is_empty() {
            return Ok(None);
        }
        let disliked = self
            .store
            .recent_books(user_id, Collection::Disliked, PROFILE_HISTORY_LIMIT)
            .await?;

        let subject_keywords = top_subject_keywords(&liked, &disliked);
        let history_authors: Vec<ShortlistedAuthor> = rank_authors(&liked)
            .into_iter()
            .take(MAX_HISTORY_AUTHORS)
            .collect();
        let suggested = self
            .suggested_authors(&history_authors, &subject_keywords)
            .await;

        let update = PreferenceUpdate {
            subject_keywords,
            favourite_publishing_period: favourite_decade(&liked),
            shortlisted_authors: merge_shortlist(history_authors, suggested),
        };
        self.store.update_preferences(user_id, &update).await?;
        Ok(Some(update))
    }

    async fn suggested_authors(
        &self,
        history: &[ShortlistedAuthor],
        subjects: &[String],
    ) -> Vec<ShortlistedAuthor> {
        let Some(suggester) = &self.suggester else {
            return Vec::new();
        };
        let names: Vec<String> = history.iter().map(|a| a.name.clone()).collect();
        let suggestions = match suggester
            .suggest_authors(&names, subjects, MAX_AUTHOR_SUGGESTIONS)
            .await
        {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "Author suggestions unavailable");
                return Vec::new();
            }
        };

        let lookups = suggestions
            .into_iter()
            .filter(|s| !s.name.trim().is_empty())
            .map(|suggestion| async move {
                match self.catalog.search_authors(suggestion.name.trim(), 1).await {
                    Ok(docs) => docs.into_iter().next().map(|doc| ShortlistedAuthor {
                        name: doc.name,
                        key: Some(author_path(&doc.key)),
                        top_work: doc.top_work,
                        work_count: doc.work_count,
                        reason: suggestion.reason,
                    }),
                    Err(e) => {
                        warn!(author = %suggestion.name, error = %e, "Author lookup failed");
                        None
                    }
                }
            });
        join_all(lookups).await.into_iter().flatten().collect()
    }
}

/// History authors first, then suggestions, without case-insensitive repeats.
fn merge_shortlist(
    history: Vec<ShortlistedAuthor>,
    suggested: Vec<ShortlistedAuthor>,
) -> Vec<ShortlistedAuthor> {
    let mut seen = HashSet::new();
    history
        .into_iter()
        .chain(suggested)
        .filter(|author| seen.insert(author.name.trim().to_lowercase()))
        .collect()
}
