use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Unique identifier for a detected pattern instance
pub type PatternId = Uuid;

/// Unique signal identifier
///
/// Producers may supply their own identifiers; when they don't, a v4 UUID
/// is generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalId(String);

impl SignalId {
    /// Generate a new unique signal ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SignalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SignalId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_id_generation_is_unique() {
        let a = SignalId::new();
        let b = SignalId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_signal_id_from_string() {
        let id = SignalId::from_string("sig-42");
        assert_eq!(id.as_str(), "sig-42");
        assert_eq!(id.to_string(), "sig-42");
    }
}
