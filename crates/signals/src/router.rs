//! Signal Router
//!
//! Declarative processor selection. Each processor registers the criteria a
//! signal must meet to reach it; the router answers which processors accept
//! a given signal, in registration order.

use indexmap::IndexMap;
use log::{debug, warn};
use pulse_core::{Signal, SignalType};
use serde::{Deserialize, Serialize};

/// Predicate a signal must satisfy to be routed to a processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorCriteria {
    /// Accepted signal types
    pub signal_types: Vec<SignalType>,
    /// Inclusive lower bound on strength
    pub min_strength: f64,
    /// Inclusive upper bound on strength
    pub max_strength: f64,
    /// Fields that must be present on the signal (top-level or metadata)
    pub required_fields: Vec<String>,
}

impl Default for ProcessorCriteria {
    fn default() -> Self {
        Self {
            signal_types: Vec::new(),
            min_strength: 0.0,
            max_strength: 1.0,
            required_fields: Vec::new(),
        }
    }
}

impl ProcessorCriteria {
    /// Criteria accepting the given types at any strength
    pub fn for_types(signal_types: &[SignalType]) -> Self {
        Self {
            signal_types: signal_types.to_vec(),
            ..Default::default()
        }
    }

    /// Criteria accepting every known type at any strength
    pub fn all_types() -> Self {
        Self::for_types(&SignalType::ALL)
    }

    pub fn with_strength_range(mut self, min_strength: f64, max_strength: f64) -> Self {
        self.min_strength = min_strength;
        self.max_strength = max_strength;
        self
    }

    pub fn with_required_field(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }

    /// Whether `signal` satisfies every clause of these criteria
    pub fn accepts(&self, signal: &Signal) -> bool {
        self.signal_types.contains(&signal.signal_type())
            && signal.strength >= self.min_strength
            && signal.strength <= self.max_strength
            && self
                .required_fields
                .iter()
                .all(|field| signal.has_field(field))
    }
}

/// Processor criteria keyed by processor id, in registration order
#[derive(Debug, Default)]
pub struct SignalRouter {
    criteria: IndexMap<String, ProcessorCriteria>,
}

impl SignalRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store criteria for a processor
    ///
    /// Re-registering an id replaces its criteria and keeps its original
    /// position in the routing order.
    pub fn register_processor(&mut self, processor_id: impl Into<String>, criteria: ProcessorCriteria) {
        let processor_id = processor_id.into();
        if criteria.min_strength > criteria.max_strength {
            warn!(
                "[ROUTER] processor {} has an empty strength range [{}, {}]",
                processor_id, criteria.min_strength, criteria.max_strength
            );
        }
        if self.criteria.insert(processor_id.clone(), criteria).is_some() {
            debug!("[ROUTER] replaced criteria for processor {}", processor_id);
        }
    }

    pub fn unregister_processor(&mut self, processor_id: &str) -> Option<ProcessorCriteria> {
        self.criteria.shift_remove(processor_id)
    }

    /// Ids of every processor whose criteria accept `signal`, in registration order
    pub fn match_signal(&self, signal: &Signal) -> Vec<String> {
        self.criteria
            .iter()
            .filter(|(_, criteria)| criteria.accepts(signal))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn criteria(&self, processor_id: &str) -> Option<&ProcessorCriteria> {
        self.criteria.get(processor_id)
    }

    pub fn processor_ids(&self) -> impl Iterator<Item = &str> {
        self.criteria.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}
