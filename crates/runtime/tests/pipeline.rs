//! End-to-end: raw events through the pipeline into the cache

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use pulse_cache::{InMemoryStore, WarmScope};
use pulse_clock::ManualClock;
use pulse_ports::{SearchClient, SearchError, SearchRequest, SearchResults};
use pulse_runtime::{Pipeline, PulseConfig};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Default)]
struct RecordingSearch {
    requests: Mutex<Vec<SearchRequest>>,
}

#[async_trait]
impl SearchClient for RecordingSearch {
    async fn search(&self, request: SearchRequest) -> Result<SearchResults, SearchError> {
        self.requests.lock().push(request);
        Ok(SearchResults {
            hits: Vec::new(),
            total: 42,
            took_ms: 8,
        })
    }
}

fn pipeline(config: PulseConfig) -> (Pipeline, Arc<RecordingSearch>) {
    let clock = ManualClock::new(Some(Utc.with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap()));
    let search = Arc::new(RecordingSearch::default());
    let pipeline = Pipeline::bootstrap(
        config,
        Arc::new(InMemoryStore::new(clock.clone())),
        search.clone(),
        clock,
    );
    (pipeline, search)
}

fn search_event(query: &str, response_time_ms: u64) -> Value {
    json!({
        "type": "search",
        "source": "api",
        "timestamp": "2024-03-13T10:05:00Z",
        "strength": 0.7,
        "data": {
            "index": "docs",
            "query": query,
            "result_count": 3,
            "response_time_ms": response_time_ms,
            "relevance": 0.8,
            "cache_hit": false
        }
    })
}

#[tokio::test]
async fn test_events_drive_processing_and_warming() {
    let _ = env_logger::try_init();
    let (pipeline, search) = pipeline(PulseConfig::default());

    for _ in 0..12 {
        pipeline.ingest(search_event("tokio runtime", 150)).await.unwrap();
    }
    pipeline.ingest(search_event("rare", 20)).await.unwrap();
    pipeline
        .ingest(json!({
            "type": "feedback",
            "timestamp": "2024-03-13T10:06:00Z",
            "data": { "rating": 4, "relevant": true }
        }))
        .await
        .unwrap();

    let stats = pipeline.coordinator().stats();
    assert_eq!(stats.signals_received, 14);
    // 13 searches hit both processors, the feedback only the time processor
    assert_eq!(stats.signals_processed, 27);
    assert_eq!(pipeline.search_processor().searches_processed(), 13);
    assert_eq!(pipeline.time_processor().signals_seen(), 14);

    let patterns = pipeline.detect_patterns();
    assert!(patterns.iter().any(|p| p.pattern_id == "search.high_relevance"));
    assert!(patterns.iter().any(|p| p.pattern_id == "time.business_hours_concentration"));

    let report = pipeline.warm_cache(WarmScope::Index("docs".to_string())).await;
    assert_eq!(report.candidates, 1);
    assert_eq!(report.revalidated, 1);
    {
        let requests = search.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "tokio runtime");
        assert!(requests[0].force_fresh);
    }

    let cached = pipeline
        .cache()
        .get_search_results("docs", "tokio runtime")
        .await
        .unwrap();
    assert!(cached.cached);
    assert_eq!(cached.results.total, 42);

    // A second run finds the entry cached
    let again = pipeline.warm_cache(WarmScope::All).await;
    assert_eq!(again.already_cached, 1);
    assert_eq!(again.revalidated, 0);
}

#[tokio::test]
async fn test_invalid_events_are_rejected() {
    let (pipeline, _) = pipeline(PulseConfig::default());

    let not_object = pipeline.ingest(json!(["search"])).await.unwrap_err();
    assert_eq!(not_object.to_string(), "Invalid event: must be an object");

    let bad_type = pipeline
        .ingest(json!({ "type": "click", "timestamp": "2024-03-13T10:05:00Z", "data": {} }))
        .await
        .unwrap_err();
    assert_eq!(bad_type.to_string(), "Invalid event: missing or invalid type");

    let no_data = pipeline
        .ingest(json!({ "type": "metric", "timestamp": "2024-03-13T10:05:00Z" }))
        .await
        .unwrap_err();
    assert_eq!(no_data.to_string(), "Invalid event: missing or invalid data");

    assert_eq!(pipeline.collector().stats().rejected, 3);
    assert_eq!(pipeline.coordinator().stats().signals_received, 0);
}

#[tokio::test]
async fn test_routing_config_is_applied() {
    let config = PulseConfig::from_json(
        r#"{ "routing": { "search": { "signal_types": ["search"], "min_strength": 0.9 } } }"#,
    )
    .unwrap();
    let (pipeline, _) = pipeline(config);

    pipeline.ingest(search_event("weak", 10)).await.unwrap();
    assert_eq!(pipeline.search_processor().signals_seen(), 0);
    assert_eq!(pipeline.time_processor().signals_seen(), 1);
}

#[tokio::test]
async fn test_shutdown_stops_warming() {
    let (pipeline, search) = pipeline(PulseConfig::default());
    for _ in 0..11 {
        pipeline.ingest(search_event("hot", 10)).await.unwrap();
    }

    pipeline.shutdown();
    let report = pipeline.warm_cache(WarmScope::All).await;
    assert_eq!(report.candidates, 1);
    assert_eq!(report.failed, 1);
    assert!(search.requests.lock().is_empty());
}

#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("pulse-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, r#"{ "default_index": "products", "queue": { "concurrent_limit": 3 } }"#)
        .unwrap();

    let config = PulseConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.default_index, "products");
    assert_eq!(config.queue.concurrent_limit, 3);
    assert_eq!(config.cache.base_ttl_secs, 3600);
}
