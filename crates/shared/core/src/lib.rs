//! Pulse Core Domain
//!
//! Pure domain types for the Pulse signal processing system.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Signal payloads
    FeedbackData,
    InteractionData,
    MetricData,
    SearchData,
    SignalData,
    // Derived observations
    FeatureValue,
    Features,
    Pattern,
    PatternType,
    // Signals
    Signal,
    SignalBuilder,
    SignalType,
};
pub use values::{PatternId, SignalId, Timestamp};
