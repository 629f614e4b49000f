//! Feedback event entity
//!
//! Append-only records of user interactions with search results. Events feed
//! the aggregator that publishes adaptive ranking weights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of recorded interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    /// User clicked a result
    Click,
    /// User reported the outcome of a search session
    Outcome,
    /// Explicit 1..5 rating
    Rating,
}

impl FeedbackKind {
    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Outcome => "outcome",
            Self::Rating => "rating",
        }
    }
}

/// Reported outcome of a search session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOutcome {
    /// The retrieved code solved the task
    Success,
    /// The retrieved code was partially useful
    Partial,
    /// The retrieval did not help
    Failure,
}

impl SearchOutcome {
    /// Whether this outcome counts as positive for weight aggregation
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Entity: Feedback Event
///
/// Written by the feedback store only; readers consume the aggregated
/// weights snapshot, never the raw log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    /// Query this event refers to
    pub query_id: String,
    /// Interaction kind
    pub kind: FeedbackKind,
    /// Clicked or rated document, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    /// Rank of the document in the response, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    /// Session outcome for `kind == outcome`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SearchOutcome>,
    /// Optional outcome confidence score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Explicit rating in `1..=5` for `kind == rating`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Query intent recorded at search time, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Free-form caller context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Submission timestamp (UTC)
    pub ts: DateTime<Utc>,
}

impl FeedbackEvent {
    /// Create a click event
    pub fn click(query_id: impl Into<String>, doc_id: impl Into<String>, rank: usize) -> Self {
        Self {
            query_id: query_id.into(),
            kind: FeedbackKind::Click,
            doc_id: Some(doc_id.into()),
            rank: Some(rank),
            outcome: None,
            score: None,
            rating: None,
            intent: None,
            context: None,
            ts: Utc::now(),
        }
    }

    /// Create an outcome event
    pub fn outcome(query_id: impl Into<String>, outcome: SearchOutcome, score: Option<f64>) -> Self {
        Self {
            query_id: query_id.into(),
            kind: FeedbackKind::Outcome,
            doc_id: None,
            rank: None,
            outcome: Some(outcome),
            score,
            rating: None,
            intent: None,
            context: None,
            ts: Utc::now(),
        }
    }

    /// Create an explicit rating event; the rating is clamped to `1..=5`
    pub fn rating(query_id: impl Into<String>, target_id: impl Into<String>, rating: u8) -> Self {
        Self {
            query_id: query_id.into(),
            kind: FeedbackKind::Rating,
            doc_id: Some(target_id.into()),
            rank: None,
            outcome: None,
            score: None,
            rating: Some(rating.clamp(1, 5)),
            intent: None,
            context: None,
            ts: Utc::now(),
        }
    }

    /// Attach the query intent recorded at search time
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }
}
