//! Feedback tool handlers
//!
//! All three tools acknowledge once the writer has accepted the event;
//! disk-level persistence failures are retried inside the store and never
//! surface here.

use serde_json::{json, Value};

use mcs_domain::entities::{FeedbackEvent, SearchOutcome};
use mcs_domain::error::{Error, Result};
use mcs_domain::ports::FeedbackSink;

use crate::args::{SubmitFeedbackArgs, TrackClickArgs, TrackOutcomeArgs};
use crate::init::AppState;

/// `submit_feedback`: explicit 1-5 rating
pub async fn submit_feedback(state: &AppState, args: SubmitFeedbackArgs) -> Result<Value> {
    let mut event = FeedbackEvent::rating(&args.target_id, &args.target_id, args.rating);
    event.context = args.context.clone().or_else(|| {
        args.notes
            .as_ref()
            .map(|notes| json!({ "notes": notes }))
    });
    state.feedback.record(event).await?;
    Ok(json!({ "stored": true }))
}

/// `track_search_click`: record a result click
pub async fn track_search_click(state: &AppState, args: TrackClickArgs) -> Result<Value> {
    let mut event = FeedbackEvent::click(&args.query_id, &args.doc_id, args.rank);
    if let Some(intent) = args.intent {
        event = event.with_intent(intent.as_str());
    }
    event.context = args.context.clone();
    state.feedback.record(event).await?;
    Ok(json!({ "tracked": true }))
}

/// `track_search_outcome`: record a session outcome
pub async fn track_search_outcome(state: &AppState, args: TrackOutcomeArgs) -> Result<Value> {
    let outcome = match args.outcome.to_lowercase().as_str() {
        "success" => SearchOutcome::Success,
        "partial" => SearchOutcome::Partial,
        "failure" => SearchOutcome::Failure,
        other => {
            return Err(Error::validation_field(
                "outcome",
                format!("unknown outcome '{other}'; use success, partial or failure"),
            ));
        }
    };
    let mut event = FeedbackEvent::outcome(&args.query_id, outcome, args.score);
    if let Some(intent) = args.intent {
        event = event.with_intent(intent.as_str());
    }
    event.context = args.context.clone();
    state.feedback.record(event).await?;
    Ok(json!({ "tracked": true }))
}
