//! Pipeline-level errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::store::StoreError;

/// Unexpected failures of a discovery run.
///
/// Expected no-op outcomes (lock held, missing profile, no keywords) are
/// reported as [`super::RunStatus`] values, not errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("trending list unavailable: {0}")]
    Trending(#[source] CatalogError),

    #[error("discovery run for {user_id} panicked: {message}")]
    Panicked { user_id: String, message: String },

    #[error("failed to release queue lock for {user_id}: {source}\n  Suggestion: The next run stays blocked until is_updating is cleared")]
    Release {
        user_id: String,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    /// True when the run failed on store contention and can be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(source) | Self::Release { source, .. } => source.is_transient(),
            Self::Trending(_) | Self::Panicked { .. } => false,
        }
    }
}
