//! Per-type signal payloads
//!
//! Each signal type carries its own metadata shape. Every field is optional:
//! producers send loosely-structured JSON, and a missing or wrongly-typed
//! field decodes to `None` instead of failing the whole signal.

use super::SignalType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata of a search signal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchData {
    pub query: Option<String>,
    pub index: Option<String>,
    pub result_count: Option<u64>,
    pub response_time_ms: Option<f64>,
    /// Mean relevance score of returned results [0, 1]
    pub relevance: Option<f64>,
    pub clicked: Option<bool>,
    pub cache_hit: Option<bool>,
    pub session_id: Option<String>,
}

/// Metadata of an explicit feedback signal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackData {
    pub rating: Option<f64>,
    pub relevant: Option<bool>,
    pub document_id: Option<String>,
    pub session_id: Option<String>,
    pub comment: Option<String>,
}

/// Metadata of a system metric sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricData {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub response_time_ms: Option<f64>,
    pub error_rate: Option<f64>,
}

/// Metadata of an implicit interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    pub action: Option<String>,
    pub duration_ms: Option<f64>,
    pub response_time_ms: Option<f64>,
    pub session_id: Option<String>,
}

/// Signal payload, tagged by signal type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalData {
    Search(SearchData),
    Feedback(FeedbackData),
    Metric(MetricData),
    Interaction(InteractionData),
}

impl SignalData {
    /// Empty payload for the given type
    pub fn empty(signal_type: SignalType) -> Self {
        match signal_type {
            SignalType::Search => SignalData::Search(SearchData::default()),
            SignalType::Feedback => SignalData::Feedback(FeedbackData::default()),
            SignalType::Metric => SignalData::Metric(MetricData::default()),
            SignalType::Interaction => SignalData::Interaction(InteractionData::default()),
        }
    }

    /// Decode a loosely-typed JSON object into the payload for `signal_type`
    ///
    /// Unknown keys are ignored; known keys holding the wrong JSON type
    /// decode to `None`.
    pub fn from_fields(signal_type: SignalType, fields: &Map<String, Value>) -> Self {
        match signal_type {
            SignalType::Search => SignalData::Search(SearchData {
                query: text(fields, "query"),
                index: text(fields, "index"),
                result_count: count(fields, "result_count"),
                response_time_ms: number(fields, "response_time_ms"),
                relevance: number(fields, "relevance"),
                clicked: flag(fields, "clicked"),
                cache_hit: flag(fields, "cache_hit"),
                session_id: text(fields, "session_id"),
            }),
            SignalType::Feedback => SignalData::Feedback(FeedbackData {
                rating: number(fields, "rating"),
                relevant: flag(fields, "relevant"),
                document_id: text(fields, "document_id"),
                session_id: text(fields, "session_id"),
                comment: text(fields, "comment"),
            }),
            SignalType::Metric => SignalData::Metric(MetricData {
                name: text(fields, "name"),
                unit: text(fields, "unit"),
                response_time_ms: number(fields, "response_time_ms"),
                error_rate: number(fields, "error_rate"),
            }),
            SignalType::Interaction => SignalData::Interaction(InteractionData {
                action: text(fields, "action"),
                duration_ms: number(fields, "duration_ms"),
                response_time_ms: number(fields, "response_time_ms"),
                session_id: text(fields, "session_id"),
            }),
        }
    }

    /// Type discriminant of this payload
    pub fn signal_type(&self) -> SignalType {
        match self {
            SignalData::Search(_) => SignalType::Search,
            SignalData::Feedback(_) => SignalType::Feedback,
            SignalData::Metric(_) => SignalType::Metric,
            SignalData::Interaction(_) => SignalType::Interaction,
        }
    }

    /// Whether the named metadata field is present on this payload
    pub fn has_field(&self, name: &str) -> bool {
        match self {
            SignalData::Search(d) => match name {
                "query" => d.query.is_some(),
                "index" => d.index.is_some(),
                "result_count" => d.result_count.is_some(),
                "response_time_ms" => d.response_time_ms.is_some(),
                "relevance" => d.relevance.is_some(),
                "clicked" => d.clicked.is_some(),
                "cache_hit" => d.cache_hit.is_some(),
                "session_id" => d.session_id.is_some(),
                _ => false,
            },
            SignalData::Feedback(d) => match name {
                "rating" => d.rating.is_some(),
                "relevant" => d.relevant.is_some(),
                "document_id" => d.document_id.is_some(),
                "session_id" => d.session_id.is_some(),
                "comment" => d.comment.is_some(),
                _ => false,
            },
            SignalData::Metric(d) => match name {
                "name" => d.name.is_some(),
                "unit" => d.unit.is_some(),
                "response_time_ms" => d.response_time_ms.is_some(),
                "error_rate" => d.error_rate.is_some(),
                _ => false,
            },
            SignalData::Interaction(d) => match name {
                "action" => d.action.is_some(),
                "duration_ms" => d.duration_ms.is_some(),
                "response_time_ms" => d.response_time_ms.is_some(),
                "session_id" => d.session_id.is_some(),
                _ => false,
            },
        }
    }

    /// Observed response time, for the payloads that carry one
    pub fn response_time_ms(&self) -> Option<f64> {
        match self {
            SignalData::Search(d) => d.response_time_ms,
            SignalData::Metric(d) => d.response_time_ms,
            SignalData::Interaction(d) => d.response_time_ms,
            SignalData::Feedback(_) => None,
        }
    }

    /// Search payload, if this is a search signal
    pub fn as_search(&self) -> Option<&SearchData> {
        match self {
            SignalData::Search(d) => Some(d),
            _ => None,
        }
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

fn count(fields: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = fields.get(key)?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64)
    })
}

fn flag(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_search_fields_decode() {
        let data = SignalData::from_fields(
            SignalType::Search,
            &fields(json!({
                "query": "rust async",
                "result_count": 12,
                "response_time_ms": 85.5,
                "relevance": 0.9,
                "clicked": true
            })),
        );

        let search = data.as_search().unwrap();
        assert_eq!(search.query.as_deref(), Some("rust async"));
        assert_eq!(search.result_count, Some(12));
        assert_eq!(search.response_time_ms, Some(85.5));
        assert_eq!(search.clicked, Some(true));
        assert_eq!(search.cache_hit, None);
    }

    #[test]
    fn test_wrongly_typed_fields_decode_to_none() {
        let data = SignalData::from_fields(
            SignalType::Search,
            &fields(json!({
                "query": 42,
                "result_count": "many",
                "relevance": "high",
                "clicked": "yes"
            })),
        );

        assert_eq!(data, SignalData::Search(SearchData::default()));
    }

    #[test]
    fn test_fractional_count_is_rounded() {
        let data = SignalData::from_fields(SignalType::Search, &fields(json!({"result_count": 3.6})));
        assert_eq!(data.as_search().unwrap().result_count, Some(4));
    }

    #[test]
    fn test_has_field_is_variant_specific() {
        let data = SignalData::from_fields(
            SignalType::Feedback,
            &fields(json!({"rating": 4.0, "query": "ignored"})),
        );

        assert!(data.has_field("rating"));
        assert!(!data.has_field("query"));
        assert!(!data.has_field("comment"));
        assert_eq!(data.signal_type(), SignalType::Feedback);
    }

    #[test]
    fn test_response_time_lookup() {
        let metric = SignalData::Metric(MetricData {
            response_time_ms: Some(250.0),
            ..Default::default()
        });
        assert_eq!(metric.response_time_ms(), Some(250.0));
        assert_eq!(SignalData::empty(SignalType::Feedback).response_time_ms(), None);
    }
}
