//! Discovery pipeline.
//!
//! One run: take the user's queue lock, source candidates, drop the ones the
//! user already has, enrich the rest, then shuffle, number and persist them
//! before releasing the lock. The lock is released on every path, including
//! errors and panics inside the run.

mod error;

pub use error::PipelineError;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::join_all;
use tracing::{error, info, instrument, warn};

use crate::catalog::Catalog;
use crate::cover::CoverLookup;
use crate::dedup;
use crate::enrich::{EnrichmentOrchestrator, EnrichmentSettings};
use crate::queue::QueueStateController;
use crate::sourcing::{Candidate, CandidateSourcer, SourcingSettings};
use crate::store::{BookStore, LockAttempt, UserProfile};
use crate::suggest::SuggestionService;

/// Trending works used to seed a new user's queue.
pub const DEFAULT_TRENDING_SEED_SIZE: u32 = 10;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    AlreadyRunning,
    ProfileMissing,
    NoKeywords,
}

/// Result of a run that did not fail unexpectedly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub status: RunStatus,
    pub written: u64,
}

impl PipelineOutcome {
    fn skipped(status: RunStatus) -> Self {
        Self { status, written: 0 }
    }

    /// Caller-facing status line.
    #[must_use]
    pub fn message(&self) -> String {
        match self.status {
            RunStatus::Completed => format!("Added {} books to the queue.", self.written),
            RunStatus::AlreadyRunning => "Queue update already in progress.".to_string(),
            RunStatus::ProfileMissing => "User profile not found.".to_string(),
            RunStatus::NoKeywords => {
                "No subject keywords yet; like a few books first.".to_string()
            }
        }
    }
}

/// Settings for every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub sourcing: SourcingSettings,
    pub enrichment: EnrichmentSettings,
    pub trending_seed_size: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sourcing: SourcingSettings::default(),
            enrichment: EnrichmentSettings::default(),
            trending_seed_size: DEFAULT_TRENDING_SEED_SIZE,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Fills a user's queue from the discovery feeds.
pub struct DiscoveryPipeline {
    store: Arc<dyn BookStore>,
    catalog: Arc<dyn Catalog>,
    controller: QueueStateController,
    sourcer: CandidateSourcer,
    enricher: EnrichmentOrchestrator,
    trending_seed_size: u32,
}

impl DiscoveryPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn BookStore>,
        catalog: Arc<dyn Catalog>,
        suggester: Option<Arc<dyn SuggestionService>>,
        covers: Option<Arc<dyn CoverLookup>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            controller: QueueStateController::new(store.clone()),
            sourcer: CandidateSourcer::new(
                catalog.clone(),
                store.clone(),
                suggester,
                settings.sourcing,
            ),
            enricher: EnrichmentOrchestrator::new(catalog.clone(), covers, settings.enrichment),
            store,
            catalog,
            trending_seed_size: settings.trending_seed_size,
        }
    }

    /// Runs the keyword and suggestion feeds for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for store failures, a panic inside the run, or
    /// a failed lock release. The lock is released before returning either way.
    #[instrument(skip(self))]
    pub async fn run(&self, user_id: &str) -> Result<PipelineOutcome, PipelineError> {
        self.under_lock(user_id, |profile| self.fill_from_feeds(profile))
            .await
    }

    /// Seeds the queue from the catalog's yearly trending list.
    ///
    /// # Errors
    ///
    /// As [`Self::run`], plus [`PipelineError::Trending`] when the trending
    /// list can't be fetched.
    #[instrument(skip(self))]
    pub async fn seed_from_trending(
        &self,
        user_id: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.under_lock(user_id, |profile| self.fill_from_trending(profile))
            .await
    }

    async fn fill_from_feeds(
        &self,
        profile: UserProfile,
    ) -> Result<PipelineOutcome, PipelineError> {
        if profile.subject_keywords.is_empty() {
            return Ok(PipelineOutcome::skipped(RunStatus::NoKeywords));
        }
        let sourced = self.sourcer.source(&profile).await;
        let written = self.enrich_and_persist(&profile, sourced.candidates).await?;
        if !sourced.explored_subjects.is_empty() {
            if let Err(e) = self
                .store
                .add_fetched_subjects(&profile.id, &sourced.explored_subjects)
                .await
            {
                warn!(error = %e, "Could not record explored subjects");
            }
        }
        Ok(PipelineOutcome {
            status: RunStatus::Completed,
            written,
        })
    }

    async fn fill_from_trending(
        &self,
        profile: UserProfile,
    ) -> Result<PipelineOutcome, PipelineError> {
        let trending = self
            .catalog
            .trending_yearly(self.trending_seed_size)
            .await
            .map_err(PipelineError::Trending)?;
        let candidates: Vec<Candidate> = join_all(trending.into_iter().map(|work| async move {
            let detail = match self.catalog.work(&work.key).await {
                Ok(detail) => Some(detail),
                Err(e) => {
                    warn!(work_key = %work.key, error = %e, "Work detail unavailable");
                    None
                }
            };
            Candidate::from_trending(work, detail)
        }))
        .await;
        let written = self.enrich_and_persist(&profile, candidates).await?;
        Ok(PipelineOutcome {
            status: RunStatus::Completed,
            written,
        })
    }

    async fn enrich_and_persist(
        &self,
        profile: &UserProfile,
        candidates: Vec<Candidate>,
    ) -> Result<u64, PipelineError> {
        let sourced = candidates.len();
        let known = self.store.known_book_keys(&profile.id).await?;
        let fresh = dedup::filter_known(candidates, &known);
        let fresh_count = fresh.len();
        let enriched = self.enricher.enrich_all(fresh).await;
        let batch = self.controller.prepare(enriched, profile.current_index);
        let written = self.controller.persist(&profile.id, &batch).await?;
        info!(
            user_id = %profile.id,
            sourced,
            fresh = fresh_count,
            written,
            "Queue batch persisted"
        );
        Ok(written)
    }

    async fn under_lock<F, Fut>(
        &self,
        user_id: &str,
        body: F,
    ) -> Result<PipelineOutcome, PipelineError>
    where
        F: FnOnce(UserProfile) -> Fut,
        Fut: Future<Output = Result<PipelineOutcome, PipelineError>>,
    {
        let profile = match self.controller.begin(user_id).await? {
            LockAttempt::Acquired(profile) => profile,
            LockAttempt::AlreadyUpdating => {
                info!(user_id, "Queue update already running, skipping");
                return Ok(PipelineOutcome::skipped(RunStatus::AlreadyRunning));
            }
            LockAttempt::ProfileMissing => {
                warn!(user_id, "No profile, skipping queue update");
                return Ok(PipelineOutcome::skipped(RunStatus::ProfileMissing));
            }
        };

        let result = AssertUnwindSafe(body(profile)).catch_unwind().await;
        let written = match &result {
            Ok(Ok(outcome)) => outcome.written,
            _ => 0,
        };
        let released = self.controller.finish(user_id, written).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(payload) => Err(PipelineError::Panicked {
                user_id: user_id.to_string(),
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Err(e) = &outcome {
            error!(user_id, error = %e, "Discovery run failed");
        }
        match released {
            Ok(()) => outcome,
            Err(source) => {
                error!(user_id, error = %source, "Failed to release queue lock");
                Err(PipelineError::Release {
                    user_id: user_id.to_string(),
                    source,
                })
            }
        }
    }
}
