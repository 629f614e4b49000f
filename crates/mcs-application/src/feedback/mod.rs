//! Feedback recording and aggregation
//!
//! Append-only JSON-lines day files written by a single writer task, and a
//! periodic aggregator that turns the event stream into adaptive ranking
//! weights. The ranker consumes weights through the read-only
//! [`WeightsPublisher`]; the cycle between ranker and feedback is broken by
//! this one-way publish.

mod aggregator;
mod store;

pub use aggregator::{FeedbackAggregator, WeightsPublisher};
pub use store::{load_window, FeedbackRecorder, FeedbackStore};
