//! Subject-keyword feed.
//!
//! Samples one random page of each top subject so repeated runs walk
//! different parts of large subject listings.

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use tracing::{debug, instrument, warn};

use super::{Candidate, SourcingSettings};
use crate::catalog::{Catalog, CatalogError};

/// Catalog form of a subject keyword: `"Science Fiction"` → `"science_fiction"`.
#[must_use]
pub fn normalize_subject(keyword: &str) -> String {
    keyword.trim().to_lowercase().replace(' ', "_")
}

/// Highest page offset sampled for a subject: `round(work_count / 100)`.
#[must_use]
pub fn max_offset(work_count: u64) -> u64 {
    work_count.saturating_add(50) / 100
}

/// Uniform offset in `[0, max_offset(work_count)]`.
pub fn pick_offset<R: Rng>(work_count: u64, rng: &mut R) -> u64 {
    rng.gen_range(0..=max_offset(work_count))
}

/// True for works published after the cutoff year.
#[must_use]
pub fn is_recent_enough(first_publish_year: Option<i32>, cutoff_year: i32) -> bool {
    first_publish_year.is_some_and(|year| year > cutoff_year)
}

/// Fetches one sampled page of a normalized subject.
#[instrument(skip(catalog, settings))]
pub(crate) async fn fetch_subject_page(
    catalog: &dyn Catalog,
    subject: &str,
    settings: &SourcingSettings,
) -> Result<Vec<Candidate>, CatalogError> {
    let work_count = catalog.subject_work_count(subject).await?;
    let offset = pick_offset(work_count, &mut rand::thread_rng());
    let page = catalog
        .subject_works(subject, offset, settings.subject_page_size)
        .await?;

    let fetched = page.works.len();
    let discovered_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let candidates: Vec<Candidate> = page
        .works
        .into_iter()
        .filter(|work| is_recent_enough(work.first_publish_year, settings.publish_year_cutoff))
        .map(|work| Candidate::from_subject_work(work, &discovered_at))
        .collect();
    debug!(work_count, offset, fetched, kept = candidates.len(), "Sampled subject page");
    Ok(candidates)
}

/// Runs every subject concurrently; failed subjects are logged and skipped.
///
/// Returns the candidates and the subjects that were fetched successfully.
pub(crate) async fn subject_feed(
    catalog: &dyn Catalog,
    keywords: &[String],
    settings: &SourcingSettings,
) -> (Vec<Candidate>, Vec<String>) {
    let subjects: Vec<String> = keywords
        .iter()
        .take(settings.max_subjects)
        .map(String::as_str)
        .map(normalize_subject)
        .filter(|subject| !subject.is_empty())
        .collect();

    let pages = futures_util::future::join_all(
        subjects
            .iter()
            .map(|subject| fetch_subject_page(catalog, subject, settings)),
    )
    .await;

    let mut candidates = Vec::new();
    let mut explored = Vec::new();
    for (subject, page) in subjects.into_iter().zip(pages) {
        match page {
            Ok(found) => {
                candidates.extend(found);
                explored.push(subject);
            }
            Err(e) => warn!(%subject, error = %e, "Subject fetch failed"),
        }
    }
    (candidates, explored)
}
