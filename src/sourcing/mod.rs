//! Candidate sourcing.
//!
//! # Overview
//!
//! - [`CandidateSourcer`] - Runs the subject and suggestion feeds concurrently
//! - [`Candidate`] - A proposed work before edition resolution
//! - [`normalize_subject`] / [`pick_offset`] - Subject page sampling
//! - [`choose_search_match`] - Suggestion-to-catalog resolution

mod candidate;
mod subject;
mod suggestion;

pub use candidate::{Candidate, CandidateSource, WORK_KEY_PREFIX, doc_id_for};
pub use subject::{is_recent_enough, max_offset, normalize_subject, pick_offset};
pub use suggestion::choose_search_match;

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::catalog::Catalog;
use crate::store::{BookStore, Collection, UserProfile};
use crate::suggest::{MAX_BOOK_SUGGESTIONS, SuggestionService};

/// Default works requested per subject page.
pub const DEFAULT_SUBJECT_PAGE_SIZE: u32 = 20;
/// Works first published in or before this year are skipped.
pub const DEFAULT_PUBLISH_YEAR_CUTOFF: i32 = 1980;

/// Tunables for sourcing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcingSettings {
    pub subject_page_size: u32,
    pub max_subjects: usize,
    pub publish_year_cutoff: i32,
    pub liked_titles_seed: u32,
    pub max_suggestions: usize,
}

impl Default for SourcingSettings {
    fn default() -> Self {
        Self {
            subject_page_size: DEFAULT_SUBJECT_PAGE_SIZE,
            max_subjects: 3,
            publish_year_cutoff: DEFAULT_PUBLISH_YEAR_CUTOFF,
            liked_titles_seed: 5,
            max_suggestions: MAX_BOOK_SUGGESTIONS,
        }
    }
}

/// Output of one sourcing pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcingOutcome {
    /// Subject-feed candidates followed by suggestion-feed candidates.
    pub candidates: Vec<Candidate>,
    /// Normalized subjects fetched successfully.
    pub explored_subjects: Vec<String>,
}

/// Produces raw candidates from the subject and suggestion feeds.
pub struct CandidateSourcer {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn BookStore>,
    suggester: Option<Arc<dyn SuggestionService>>,
    settings: SourcingSettings,
}

impl CandidateSourcer {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn BookStore>,
        suggester: Option<Arc<dyn SuggestionService>>,
        settings: SourcingSettings,
    ) -> Self {
        Self {
            catalog,
            store,
            suggester,
            settings,
        }
    }

    /// Runs both feeds; a failing feed contributes nothing.
    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    pub async fn source(&self, profile: &UserProfile) -> SourcingOutcome {
        let ((subject_candidates, explored_subjects), suggested) = tokio::join!(
            subject::subject_feed(
                self.catalog.as_ref(),
                &profile.subject_keywords,
                &self.settings
            ),
            self.suggestion_candidates(&profile.id)
        );
        debug!(
            subject = subject_candidates.len(),
            suggestion = suggested.len(),
            "Sourced candidates"
        );

        let mut candidates = subject_candidates;
        candidates.extend(suggested);
        SourcingOutcome {
            candidates,
            explored_subjects,
        }
    }

    async fn suggestion_candidates(&self, user_id: &str) -> Vec<Candidate> {
        let Some(suggester) = &self.suggester else {
            return Vec::new();
        };
        let liked = match self
            .store
            .recent_books(user_id, Collection::Liked, self.settings.liked_titles_seed)
            .await
        {
            Ok(liked) => liked,
            Err(e) => {
                warn!(error = %e, "Could not read liked titles for suggestions");
                return Vec::new();
            }
        };
        let titles: Vec<String> = liked
            .iter()
            .filter_map(|book| book.text_field("title"))
            .filter(|title| !title.trim().is_empty())
            .map(str::to_string)
            .collect();
        if titles.is_empty() {
            debug!("No liked titles to seed suggestions");
            return Vec::new();
        }
        suggestion::suggestion_feed(
            self.catalog.as_ref(),
            suggester.as_ref(),
            &titles,
            self.settings.max_suggestions,
        )
        .await
    }
}
