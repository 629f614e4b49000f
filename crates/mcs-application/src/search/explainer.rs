//! Result explanation
//!
//! Turns a ranked result's recorded factors into a per-result rationale.
//! `basic` mode reports the top factors; `enhanced` mode reports the full
//! vector including per-field matches and adaptive weight deltas.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use mcs_domain::error::{Error, Result};
use mcs_domain::value_objects::{RankedResult, RankingFactor};

/// Explanation verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainMode {
    /// Top contributing factors only
    Basic,
    /// Full factor vector with field matches
    Enhanced,
}

impl FromStr for ExplainMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "enhanced" => Ok(Self::Enhanced),
            _ => Err(Error::validation_field(
                "mode",
                "mode must be 'basic' or 'enhanced'",
            )),
        }
    }
}

/// Factors shown in basic mode
const BASIC_FACTOR_LIMIT: usize = 3;

/// One result's ranking rationale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Document id
    pub id: String,
    /// Position in the response
    pub rank: usize,
    /// Final relevance
    pub relevance: f64,
    /// Contributing factors, strongest first
    pub factors: Vec<RankingFactor>,
    /// Per-field highlight matches (enhanced mode)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub field_matches: HashMap<String, Vec<String>>,
    /// One-line summary of the strongest factor
    pub summary: String,
}

/// Ranking explainer
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultExplainer;

impl ResultExplainer {
    /// Create an explainer
    pub fn new() -> Self {
        Self
    }

    /// Explain one ranked result
    pub fn explain(&self, result: &RankedResult, mode: ExplainMode) -> Explanation {
        let mut factors = result.factors.clone();
        factors.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let summary = factors
            .first()
            .map(|f| format!("{}: {}", f.factor, f.detail))
            .unwrap_or_else(|| "no recorded factors".to_string());

        let (factors, field_matches) = match mode {
            ExplainMode::Basic => {
                factors.truncate(BASIC_FACTOR_LIMIT);
                (factors, HashMap::new())
            }
            ExplainMode::Enhanced => (factors, result.highlights.clone()),
        };

        Explanation {
            id: result.id.clone(),
            rank: result.rank,
            relevance: result.relevance,
            factors,
            field_matches,
            summary,
        }
    }

    /// Explain a whole response page
    pub fn explain_all(&self, results: &[RankedResult], mode: ExplainMode) -> Vec<Explanation> {
        results.iter().map(|r| self.explain(r, mode)).collect()
    }
}
