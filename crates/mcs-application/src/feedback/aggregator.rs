//! Feedback aggregation
//!
//! Periodically folds the feedback event stream into a weights snapshot:
//! per-`(intent, field)` click-through and positive-outcome rates over a
//! sliding window, smoothed across runs with an exponential moving average.
//! Snapshots publish copy-on-write; readers never observe a partial update.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use mcs_domain::entities::{FeedbackEvent, FeedbackKind};
use mcs_domain::ports::WeightsSource;
use mcs_domain::value_objects::{FieldWeight, WeightsSnapshot};

use super::store::load_window;

/// Smoothing factor: how much one aggregator run moves the weights
const EMA_ALPHA: f64 = 0.3;

/// Weight bounds keeping any single field from dominating
const WEIGHT_MIN: f64 = 0.5;
const WEIGHT_MAX: f64 = 2.0;

/// Field recorded when a click carries no field attribution
const DEFAULT_FIELD: &str = "content";

/// Lock-free holder of the latest weights snapshot
pub struct WeightsPublisher {
    snapshot: ArcSwap<WeightsSnapshot>,
}

impl WeightsPublisher {
    /// Create a publisher holding the empty snapshot
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(WeightsSnapshot::empty()),
        }
    }

    /// Publish a new snapshot
    pub fn publish(&self, snapshot: WeightsSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }
}

impl Default for WeightsPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightsSource for WeightsPublisher {
    fn latest(&self) -> Arc<WeightsSnapshot> {
        self.snapshot.load_full()
    }
}

/// Periodic feedback aggregator with an explicit start/stop lifecycle
pub struct FeedbackAggregator {
    dir: PathBuf,
    window_days: u32,
    interval: Duration,
    publisher: Arc<WeightsPublisher>,
    task: Option<JoinHandle<()>>,
}

impl FeedbackAggregator {
    /// Create an aggregator over the store's directory
    pub fn new(
        dir: impl Into<PathBuf>,
        window_days: u32,
        interval: Duration,
        publisher: Arc<WeightsPublisher>,
    ) -> Self {
        Self {
            dir: dir.into(),
            window_days,
            interval,
            publisher,
            task: None,
        }
    }

    /// Start the periodic aggregation task. Idempotent.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        let dir = self.dir.clone();
        let window_days = self.window_days;
        let interval = self.interval;
        let publisher = Arc::clone(&self.publisher);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let events = load_window(&dir, window_days).await;
                let previous = publisher.latest();
                let snapshot = aggregate(&events, &previous);
                debug!(version = snapshot.version, events = events.len(), "published weights");
                publisher.publish(snapshot);
            }
        }));
        info!(interval_secs = self.interval.as_secs(), "feedback aggregator started");
    }

    /// Stop the aggregation task
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    /// Run one aggregation pass immediately and publish the result
    pub async fn run_once(&self) -> WeightsSnapshot {
        let events = load_window(&self.dir, self.window_days).await;
        let previous = self.publisher.latest();
        let snapshot = aggregate(&events, &previous);
        self.publisher.publish(snapshot.clone());
        snapshot
    }
}

/// Fold events into a new snapshot, smoothing against the previous one
pub fn aggregate(events: &[FeedbackEvent], previous: &WeightsSnapshot) -> WeightsSnapshot {
    // Positive-outcome rate per intent, from outcome events.
    let mut outcomes: HashMap<String, (u64, u64)> = HashMap::new();
    // Query ids with a positive outcome, to credit their clicked fields.
    let mut positive_queries: HashSet<&str> = HashSet::new();
    for event in events {
        if event.kind != FeedbackKind::Outcome {
            continue;
        }
        let intent = event.intent.clone().unwrap_or_default();
        let entry = outcomes.entry(intent).or_default();
        entry.1 += 1;
        if event.outcome.is_some_and(|o| o.is_positive()) {
            entry.0 += 1;
            positive_queries.insert(event.query_id.as_str());
        }
    }

    // Clicks per (intent, field).
    let mut clicks: HashMap<(String, String), (u64, u64)> = HashMap::new();
    let mut clicks_per_intent: HashMap<String, u64> = HashMap::new();
    for event in events {
        if event.kind != FeedbackKind::Click {
            continue;
        }
        let Some(intent) = event.intent.clone() else {
            continue;
        };
        let field = event
            .context
            .as_ref()
            .and_then(|c| c.get("field"))
            .and_then(|f| f.as_str())
            .unwrap_or(DEFAULT_FIELD)
            .to_string();
        *clicks_per_intent.entry(intent.clone()).or_default() += 1;
        let entry = clicks.entry((intent, field)).or_default();
        entry.0 += 1;
        if positive_queries.contains(event.query_id.as_str()) {
            entry.1 += 1;
        }
    }

    let mut by_intent: HashMap<String, HashMap<String, FieldWeight>> = HashMap::new();
    for ((intent, field), (click_count, positive_clicks)) in clicks {
        let intent_total = clicks_per_intent.get(&intent).copied().unwrap_or(1).max(1);
        let ctr = click_count as f64 / intent_total as f64;
        let positive_rate = match outcomes.get(&intent) {
            Some((positive, total)) if *total > 0 => *positive as f64 / *total as f64,
            _ if click_count > 0 => positive_clicks as f64 / click_count as f64,
            _ => 0.0,
        };

        let target = (1.0 + 0.5 * ctr + 0.5 * positive_rate).clamp(WEIGHT_MIN, WEIGHT_MAX);
        let previous_weight = previous
            .by_intent
            .get(&intent)
            .and_then(|fields| fields.get(&field))
            .map_or(1.0, |w| w.weight);
        let weight = (EMA_ALPHA * target + (1.0 - EMA_ALPHA) * previous_weight)
            .clamp(WEIGHT_MIN, WEIGHT_MAX);

        by_intent.entry(intent).or_default().insert(
            field,
            FieldWeight {
                ctr,
                positive_rate,
                weight,
                samples: click_count,
            },
        );
    }

    // Intents with no fresh clicks keep their previous (decaying) weights.
    for (intent, fields) in &previous.by_intent {
        let target = by_intent.entry(intent.clone()).or_default();
        for (field, weight) in fields {
            target.entry(field.clone()).or_insert_with(|| {
                let decayed = EMA_ALPHA + (1.0 - EMA_ALPHA) * weight.weight;
                FieldWeight {
                    ctr: 0.0,
                    positive_rate: 0.0,
                    weight: decayed.clamp(WEIGHT_MIN, WEIGHT_MAX),
                    samples: 0,
                }
            });
        }
    }

    WeightsSnapshot {
        version: previous.version + 1,
        generated_at: Utc::now(),
        by_intent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcs_domain::entities::SearchOutcome;
    use mcs_domain::value_objects::SearchIntent;
    use serde_json::json;

    fn click(query_id: &str, field: &str) -> FeedbackEvent {
        let mut event = FeedbackEvent::click(query_id, "doc1", 1).with_intent("implement");
        event.context = Some(json!({ "field": field }));
        event
    }

    #[test]
    fn clicks_raise_the_clicked_fields_weight() {
        let mut events: Vec<FeedbackEvent> =
            (0..100).map(|_| click("q1", "function_name")).collect();
        events.push(
            FeedbackEvent::outcome("q1", SearchOutcome::Success, None).with_intent("implement"),
        );

        let snapshot = aggregate(&events, &WeightsSnapshot::empty());
        let boost = snapshot.boost(SearchIntent::Implement, "function_name");
        assert!(boost > 1.0, "expected boost above neutral, got {boost}");
        assert_eq!(snapshot.version, 1);

        let record = snapshot
            .field_weight(SearchIntent::Implement, "function_name")
            .unwrap();
        assert_eq!(record.samples, 100);
        assert!(record.positive_rate > 0.99);
    }

    #[test]
    fn repeated_runs_converge_monotonically() {
        let events: Vec<FeedbackEvent> = (0..50)
            .map(|_| click("q1", "function_name"))
            .chain(std::iter::once(
                FeedbackEvent::outcome("q1", SearchOutcome::Success, None)
                    .with_intent("implement"),
            ))
            .collect();

        let first = aggregate(&events, &WeightsSnapshot::empty());
        let second = aggregate(&events, &first);
        let third = aggregate(&events, &second);
        let boost = |s: &WeightsSnapshot| s.boost(SearchIntent::Implement, "function_name");
        assert!(boost(&second) >= boost(&first));
        assert!(boost(&third) >= boost(&second));
        assert!(boost(&third) <= WEIGHT_MAX);
    }

    #[test]
    fn unclicked_fields_decay_toward_neutral() {
        let mut previous = WeightsSnapshot::empty();
        previous
            .by_intent
            .entry("debug".to_string())
            .or_default()
            .insert(
                "content".to_string(),
                FieldWeight {
                    ctr: 0.9,
                    positive_rate: 0.9,
                    weight: 1.8,
                    samples: 500,
                },
            );

        let snapshot = aggregate(&[], &previous);
        let weight = snapshot
            .field_weight(SearchIntent::Debug, "content")
            .unwrap()
            .weight;
        assert!(weight < 1.8);
        assert!(weight > 1.0);
    }

    #[test]
    fn versions_increase_monotonically() {
        let a = aggregate(&[], &WeightsSnapshot::empty());
        let b = aggregate(&[], &a);
        assert_eq!(a.version, 1);
        assert_eq!(b.version, 2);
    }

    #[tokio::test]
    async fn publisher_swaps_whole_snapshots() {
        let publisher = WeightsPublisher::new();
        assert_eq!(publisher.latest().version, 0);
        publisher.publish(WeightsSnapshot {
            version: 7,
            generated_at: Utc::now(),
            by_intent: HashMap::new(),
        });
        assert_eq!(publisher.latest().version, 7);
    }
}
