//! Adaptive ranking weight snapshots
//!
//! The feedback aggregator publishes immutable [`WeightsSnapshot`] values;
//! the ranker reads the latest snapshot and never calls back into the
//! feedback store. One snapshot is read per ranking operation, so a ranking
//! pass never observes a torn update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value_objects::SearchIntent;

/// Aggregated weight for one `(intent, field)` pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldWeight {
    /// Click-through rate over the sliding window
    pub ctr: f64,
    /// Positive-outcome rate over the sliding window
    pub positive_rate: f64,
    /// Derived multiplicative boost applied by the ranker
    pub weight: f64,
    /// Number of events the estimate is based on
    pub samples: u64,
}

impl Default for FieldWeight {
    fn default() -> Self {
        Self {
            ctr: 0.0,
            positive_rate: 0.0,
            weight: 1.0,
            samples: 0,
        }
    }
}

/// Value Object: Weights Snapshot
///
/// Immutable once published. `version` increases monotonically with each
/// aggregator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsSnapshot {
    /// Monotonic snapshot version
    pub version: u64,
    /// When the aggregator produced this snapshot
    pub generated_at: DateTime<Utc>,
    /// `intent -> field -> weight`
    pub by_intent: HashMap<String, HashMap<String, FieldWeight>>,
}

impl WeightsSnapshot {
    /// An empty snapshot; all boosts are neutral
    pub fn empty() -> Self {
        Self {
            version: 0,
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
            by_intent: HashMap::new(),
        }
    }

    /// Weight record for an `(intent, field)` pair, when one was aggregated
    pub fn field_weight(&self, intent: SearchIntent, field: &str) -> Option<&FieldWeight> {
        self.by_intent.get(intent.as_str())?.get(field)
    }

    /// Multiplicative boost for an `(intent, field)` pair; neutral when the
    /// pair has no aggregated data
    pub fn boost(&self, intent: SearchIntent, field: &str) -> f64 {
        self.field_weight(intent, field).map_or(1.0, |w| w.weight)
    }
}

impl Default for WeightsSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
