//! Extracted feature container

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single feature value: numeric or boolean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Flag(bool),
    Number(f64),
}

impl FeatureValue {
    /// Numeric view of the value (`true` = 1.0, `false` = 0.0)
    pub fn as_f64(&self) -> f64 {
        match self {
            FeatureValue::Number(v) => *v,
            FeatureValue::Flag(true) => 1.0,
            FeatureValue::Flag(false) => 0.0,
        }
    }
}

/// Named features extracted from a signal
///
/// Ordered by name so serialized output and iteration are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    #[serde(flatten)]
    values: BTreeMap<String, FeatureValue>,
}

impl Features {
    /// Create empty features
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a numeric feature
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), FeatureValue::Number(value));
    }

    /// Set a boolean feature
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.values.insert(name.into(), FeatureValue::Flag(value));
    }

    /// Numeric value of a feature (flags read as 0/1)
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).map(FeatureValue::as_f64)
    }

    /// Boolean value of a flag feature
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(FeatureValue::Flag(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<FeatureValue> {
        self.values.get(name).copied()
    }

    /// Check if a feature with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Merge another Features into this one (other wins on conflict)
    pub fn merge(&mut self, other: Features) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_flag_features() {
        let mut features = Features::new();
        features.set("response_time", 120.0);
        features.set_flag("is_weekend", true);

        assert_eq!(features.get("response_time"), Some(120.0));
        assert_eq!(features.get("is_weekend"), Some(1.0));
        assert_eq!(features.flag("is_weekend"), Some(true));
        assert_eq!(features.flag("response_time"), None);
        assert_eq!(features.get("missing"), None);
    }

    #[test]
    fn test_merge_overrides() {
        let mut a = Features::new();
        a.set("x", 1.0);
        a.set("y", 2.0);

        let mut b = Features::new();
        b.set("y", 3.0);

        a.merge(b);
        assert_eq!(a.get("x"), Some(1.0));
        assert_eq!(a.get("y"), Some(3.0));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_serializes_as_flat_record() {
        let mut features = Features::new();
        features.set("hour", 10.0);
        features.set_flag("is_business_hours", true);

        let json = serde_json::to_value(&features).unwrap();
        assert_eq!(json, serde_json::json!({"hour": 10.0, "is_business_hours": true}));
    }
}
