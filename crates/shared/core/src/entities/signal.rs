//! Signal entity - the unit of ingestion

use super::{Features, Pattern, SignalData, SignalType};
use crate::values::{SignalId, Timestamp};
use serde::{Deserialize, Serialize};

/// Top-level fields every signal carries
const TOP_LEVEL_FIELDS: [&str; 6] = ["id", "source", "timestamp", "value", "strength", "priority"];

/// A discrete observation emitted by a producer
///
/// Immutable once collected. Processors never mutate a signal in place;
/// they return a transformed copy with `processed` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    /// Producer that emitted the signal
    pub source: String,
    pub timestamp: Timestamp,
    /// Primary scalar observation
    pub value: f64,
    /// Signal strength [0, 1]
    pub strength: f64,
    /// Type-specific metadata; its variant is the signal type
    pub data: SignalData,
    pub processed: bool,
    pub priority: f64,
    /// Features attached by a processor
    #[serde(default)]
    pub features: Features,
    /// Patterns attached by a processor
    #[serde(default)]
    pub patterns: Vec<Pattern>,
}

impl Signal {
    /// Create a new signal builder
    pub fn builder(data: SignalData, timestamp: Timestamp) -> SignalBuilder {
        SignalBuilder::new(data, timestamp)
    }

    pub fn signal_type(&self) -> SignalType {
        self.data.signal_type()
    }

    /// Whether `name` is present on this signal's own structure
    ///
    /// Top-level fields are always present; metadata fields are present
    /// when the payload of this signal's type carries a value for them.
    pub fn has_field(&self, name: &str) -> bool {
        TOP_LEVEL_FIELDS.contains(&name) || self.data.has_field(name)
    }

    /// Copy of this signal marked as processed
    pub fn processed_copy(&self, features: Features, priority: f64) -> Signal {
        Signal {
            features,
            priority,
            processed: true,
            ..self.clone()
        }
    }
}

/// Builder for constructing Signal entities
pub struct SignalBuilder {
    id: Option<SignalId>,
    source: String,
    timestamp: Timestamp,
    value: f64,
    strength: f64,
    data: SignalData,
    priority: f64,
}

impl SignalBuilder {
    /// Create a new builder with required fields
    pub fn new(data: SignalData, timestamp: Timestamp) -> Self {
        Self {
            id: None,
            source: "unknown".to_string(),
            timestamp,
            value: 0.0,
            strength: 0.0,
            data,
            priority: 0.0,
        }
    }

    pub fn id(mut self, id: impl Into<SignalId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Set the strength (clamped to [0, 1])
    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn build(self) -> Signal {
        Signal {
            id: self.id.unwrap_or_default(),
            source: self.source,
            timestamp: self.timestamp,
            value: self.value,
            strength: self.strength,
            data: self.data,
            processed: false,
            priority: self.priority,
            features: Features::new(),
            patterns: Vec::new(),
        }
    }
}
