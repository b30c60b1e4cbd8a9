//! Request adapters for the callable endpoints.
//!
//! Validates request parameters and maps outcomes onto the three caller-facing
//! error codes. All queue filling goes through [`DiscoveryPipeline`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::pipeline::{DiscoveryPipeline, PipelineError, PipelineOutcome};
use crate::store::{BookStore, StoreError};
use crate::swipe::{Swipe, SwipeError, SwipeService};

/// Caller-facing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallableError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl CallableError {
    /// Wire code of the error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid-argument",
            Self::NotFound(_) => "not-found",
            Self::Internal(_) => "internal",
        }
    }
}

const STORE_BUSY_MESSAGE: &str = "Storage is busy, try again later.";

impl From<PipelineError> for CallableError {
    fn from(e: PipelineError) -> Self {
        if e.is_transient() {
            warn!(error = %e, "Discovery pipeline hit store contention");
            return Self::Internal(STORE_BUSY_MESSAGE.to_string());
        }
        error!(error = %e, "Discovery pipeline failed");
        Self::Internal("Failed to update the book queue.".to_string())
    }
}

impl From<StoreError> for CallableError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            warn!(error = %e, "Store contention");
            return Self::Internal(STORE_BUSY_MESSAGE.to_string());
        }
        error!(error = %e, "Store operation failed");
        Self::Internal("Storage operation failed.".to_string())
    }
}

/// `fetch_books` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchBooksRequest {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

/// `like_book` / `dislike_book` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwipeRequest {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub book: Option<String>,
}

/// `setup_user` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupRequest {
    #[serde(default)]
    pub user: Option<String>,
}

/// Successful callable response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallableResponse {
    pub message: String,
}

impl CallableResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn required<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, CallableError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CallableError::InvalidArgument(format!("Missing {name} param.")))
}

/// The callable surface over one store.
pub struct Callables {
    store: Arc<dyn BookStore>,
    pipeline: Arc<DiscoveryPipeline>,
    swipes: SwipeService,
}

impl Callables {
    #[must_use]
    pub fn new(store: Arc<dyn BookStore>, pipeline: Arc<DiscoveryPipeline>) -> Self {
        Self {
            swipes: SwipeService::new(store.clone()),
            store,
            pipeline,
        }
    }

    /// Runs the discovery pipeline for a user.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without a user id; `Internal` when the run fails.
    pub async fn fetch_books(
        &self,
        request: &FetchBooksRequest,
    ) -> Result<CallableResponse, CallableError> {
        let user_id = required(request.user_id.as_ref(), "userId")?;
        let outcome: PipelineOutcome = self.pipeline.run(user_id).await?;
        Ok(CallableResponse::new(outcome.message()))
    }

    /// Moves a book into the liked set.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for missing params, `NotFound` when the book is in
    /// neither the queue nor the disliked set.
    pub async fn like_book(
        &self,
        request: &SwipeRequest,
    ) -> Result<CallableResponse, CallableError> {
        self.swipe(request, Swipe::Like).await
    }

    /// Moves a book into the disliked set.
    ///
    /// # Errors
    ///
    /// As [`Self::like_book`], with the liked set as the alternative source.
    pub async fn dislike_book(
        &self,
        request: &SwipeRequest,
    ) -> Result<CallableResponse, CallableError> {
        self.swipe(request, Swipe::Dislike).await
    }

    /// Creates the user's profile and seeds the queue with trending books.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without a user; `Internal` when storage or seeding fails.
    pub async fn setup_user(
        &self,
        request: &SetupRequest,
    ) -> Result<CallableResponse, CallableError> {
        let user_id = required(request.user.as_ref(), "user")?;
        self.store.create_profile(user_id).await?;
        let outcome = self.pipeline.seed_from_trending(user_id).await?;
        Ok(CallableResponse::new(format!(
            "Profile ready. {}",
            outcome.message()
        )))
    }

    async fn swipe(
        &self,
        request: &SwipeRequest,
        swipe: Swipe,
    ) -> Result<CallableResponse, CallableError> {
        let user_id = required(request.user.as_ref(), "user")?;
        let doc_id = required(request.book.as_ref(), "book")?;
        match self.swipes.swipe(user_id, doc_id, swipe).await {
            Ok(moved) => Ok(CallableResponse::new(format!(
                "Book moved to {} books.",
                moved.collection
            ))),
            Err(e @ SwipeError::NotFound { .. }) => Err(CallableError::NotFound(e.to_string())),
            Err(SwipeError::Store(e)) => Err(e.into()),
        }
    }
}
