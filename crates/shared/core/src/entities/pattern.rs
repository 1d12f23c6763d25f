use super::Signal;
use crate::values::{PatternId, SignalId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of supporting signals at which a pattern reaches full impact
const FULL_IMPACT_FREQUENCY: f64 = 10.0;

/// Pattern classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Time-of-day / day-of-week regularities
    Temporal,
    /// Latency and throughput observations
    Performance,
    /// Result quality (relevance, empty results)
    Quality,
    /// User behavior regularities
    Behavioral,
}

/// An aggregate, confidence-scored observation over multiple signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Unique instance id
    pub id: PatternId,
    /// Stable name of the detected pattern kind, e.g. `search.slow_search`
    pub pattern_id: String,
    pub pattern_type: PatternType,
    /// Signals the pattern was derived from
    pub signal_ids: Vec<SignalId>,
    /// Confidence [0, 1]
    pub confidence: f64,
    /// Number of supporting signals
    pub frequency: u32,
    /// Confidence weighted by how many signals support the pattern
    pub impact_score: f64,
    /// The metric value that crossed the detection threshold
    pub observed_value: f64,
    #[serde(default)]
    pub related_patterns: Vec<String>,
}

impl Pattern {
    /// Create a pattern supported by `signals`
    pub fn new<'a>(
        pattern_id: impl Into<String>,
        pattern_type: PatternType,
        signals: impl IntoIterator<Item = &'a Signal>,
        confidence: f64,
        observed_value: f64,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let signal_ids: Vec<SignalId> = signals.into_iter().map(|s| s.id.clone()).collect();
        let frequency = signal_ids.len() as u32;
        let support = (frequency as f64 / FULL_IMPACT_FREQUENCY).min(1.0);

        Self {
            id: Uuid::new_v4(),
            pattern_id: pattern_id.into(),
            pattern_type,
            signal_ids,
            confidence,
            frequency,
            impact_score: confidence * support,
            observed_value,
            related_patterns: Vec::new(),
        }
    }

    pub fn with_related(mut self, related: impl Into<String>) -> Self {
        self.related_patterns.push(related.into());
        self
    }
}
