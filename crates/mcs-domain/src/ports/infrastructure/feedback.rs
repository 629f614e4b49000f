//! Feedback recording ports
//!
//! The ranker/feedback cycle is broken with a one-way publish: the feedback
//! store implements [`FeedbackSink`] for writers and [`WeightsSource`] for
//! readers, and the ranker never calls back into the store.

use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::FeedbackEvent;
use crate::error::Result;
use crate::value_objects::WeightsSnapshot;

/// Port: Feedback Sink
///
/// Records user interactions. `record` resolves once the event has been
/// accepted by the writer (acknowledged before the tool response returns);
/// persistence failures are logged and retried, never surfaced to the
/// originating call.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Record one feedback event
    async fn record(&self, event: FeedbackEvent) -> Result<()>;
}

/// Port: Weights Source
///
/// Lock-free access to the latest published weights snapshot. Each ranking
/// operation reads exactly one snapshot.
pub trait WeightsSource: Send + Sync {
    /// The most recently published snapshot
    fn latest(&self) -> Arc<WeightsSnapshot>;
}
