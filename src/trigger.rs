//! Store event handling.
//!
//! Liked-book creations refresh the preference profile. Any swipe creation
//! refills the queue through [`DiscoveryPipeline::run`] once it runs low.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::pipeline::DiscoveryPipeline;
use crate::profiler::PreferenceProfiler;
use crate::store::{BookStore, Collection, StoreEvent};

/// Queue size below which a swipe triggers a refill.
pub const DEFAULT_REFILL_THRESHOLD: u64 = 5;

/// Routes store creation events to the profiler and the pipeline.
pub struct EventDispatcher {
    profiler: Arc<PreferenceProfiler>,
    pipeline: Arc<DiscoveryPipeline>,
    store: Arc<dyn BookStore>,
    refill_threshold: u64,
}

impl EventDispatcher {
    #[must_use]
    pub fn new(
        profiler: Arc<PreferenceProfiler>,
        pipeline: Arc<DiscoveryPipeline>,
        store: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            profiler,
            pipeline,
            store,
            refill_threshold: DEFAULT_REFILL_THRESHOLD,
        }
    }

    /// Sets the refill threshold; `0` disables refills.
    #[must_use]
    pub fn with_refill_threshold(mut self, threshold: u64) -> Self {
        self.refill_threshold = threshold;
        self
    }

    /// Handles one event. Failures are logged.
    pub async fn handle(&self, event: &StoreEvent) {
        let StoreEvent::BookCreated {
            user_id,
            doc_id,
            collection,
        } = event;
        if *collection == Collection::Queue {
            return;
        }
        debug!(user_id = %user_id, doc_id = %doc_id, %collection, "Swipe recorded");
        if *collection == Collection::Liked {
            self.profiler.on_liked_book_created(user_id).await;
        }
        self.refill_if_low(user_id).await;
    }

    async fn refill_if_low(&self, user_id: &str) {
        let queued = match self.store.count_books(user_id, Collection::Queue).await {
            Ok(count) => count,
            Err(e) => {
                warn!(user_id, error = %e, "Could not count queued books");
                return;
            }
        };
        if queued >= self.refill_threshold {
            return;
        }
        info!(
            user_id,
            queued,
            threshold = self.refill_threshold,
            "Queue running low, refilling"
        );
        match self.pipeline.run(user_id).await {
            Ok(outcome) => info!(
                user_id,
                status = ?outcome.status,
                written = outcome.written,
                "Refill finished"
            ),
            Err(e) => warn!(user_id, error = %e, "Refill failed"),
        }
    }

    /// Handles every event already buffered in `rx`, including those raised
    /// while handling. Returns the number of events seen.
    pub async fn drain(&self, rx: &mut broadcast::Receiver<StoreEvent>) -> usize {
        let mut seen = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    seen += 1;
                    self.handle(&event).await;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event receiver lagged, events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return seen,
            }
        }
    }

    /// Runs the dispatcher until the sending side closes.
    ///
    /// Every event is handled on its own task, so a slow refill for one user
    /// never holds up events for another.
    pub fn spawn(self: Arc<Self>, mut rx: broadcast::Receiver<StoreEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let this = Arc::clone(&self);
                        tokio::spawn(async move { this.handle(&event).await });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event receiver lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event channel closed, dispatcher stopping");
                        break;
                    }
                }
            }
        })
    }
}
