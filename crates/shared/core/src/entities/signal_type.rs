use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal type classification
///
/// The closed set of signal kinds the system ingests. Observers and
/// processors are keyed by this discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// A search request and its outcome
    Search,
    /// Explicit user feedback on a result
    Feedback,
    /// A system metric sample
    Metric,
    /// An implicit user interaction (click, dwell, scroll)
    Interaction,
}

impl SignalType {
    /// Every known signal type, in declaration order
    pub const ALL: [SignalType; 4] = [
        SignalType::Search,
        SignalType::Feedback,
        SignalType::Metric,
        SignalType::Interaction,
    ];

    /// Parse a wire name (`"search"`, `"feedback"`, ...)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "search" => Some(SignalType::Search),
            "feedback" => Some(SignalType::Feedback),
            "metric" => Some(SignalType::Metric),
            "interaction" => Some(SignalType::Interaction),
            _ => None,
        }
    }

    /// Wire name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Search => "search",
            SignalType::Feedback => "feedback",
            SignalType::Metric => "metric",
            SignalType::Interaction => "interaction",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
