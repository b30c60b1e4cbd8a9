//! Bookswipe Core Library
//!
//! This library builds and maintains a personalized, de-duplicated queue of
//! candidate books for a swipe-style discovery app.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`edition`] - Best-edition selection
//! - [`profiler`] - Preference scoring over swipe history
//! - [`sourcing`] - Subject and suggestion candidate feeds
//! - [`dedup`] - Removal of already-known works
//! - [`enrich`] - Edition, author and cover enrichment
//! - [`queue`] - Queue lock, index allocation and batch persistence
//! - [`pipeline`] - One discovery run, end to end
//! - [`swipe`], [`callable`], [`trigger`] - Entry points
//! - [`store`], [`db`] - Profile and book persistence
//! - [`catalog`], [`suggest`], [`cover`] - External service clients

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod callable;
pub mod catalog;
pub mod cover;
pub mod db;
pub mod dedup;
pub mod edition;
pub mod enrich;
pub mod pipeline;
pub mod profiler;
pub mod queue;
pub mod sourcing;
pub mod store;
pub mod suggest;
pub mod swipe;
pub mod trigger;
pub(crate) mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use callable::{
    CallableError, CallableResponse, Callables, FetchBooksRequest, SetupRequest, SwipeRequest,
};
pub use catalog::{Catalog, CatalogError, HttpSettings, OpenLibraryClient};
pub use cover::{CoverLookup, CoverServiceClient};
pub use db::{Database, DatabaseOptions};
pub use pipeline::{DiscoveryPipeline, PipelineError, PipelineOutcome, PipelineSettings, RunStatus};
pub use profiler::PreferenceProfiler;
pub use store::{BookStore, Collection, SqliteStore, StoreError, StoreEvent, UserProfile};
pub use suggest::{GeminiClient, SuggestionService};
pub use swipe::{Swipe, SwipeError, SwipeService};
pub use trigger::{DEFAULT_REFILL_THRESHOLD, EventDispatcher};
