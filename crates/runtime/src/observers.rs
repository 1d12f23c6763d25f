//! Observers that connect signal ingestion to the cache

use async_trait::async_trait;
use log::trace;
use pulse_cache::AdaptiveCacheStrategy;
use pulse_core::Signal;
use pulse_ports::{Notifiable, ObserverError};
use std::sync::Arc;

/// Feeds search signals into the cache's query pattern tracking
///
/// Every search signal with a query counts as one access of that query,
/// with the signal's response time and cache hit flag.
pub struct SearchAccessObserver {
    strategy: Arc<AdaptiveCacheStrategy>,
    default_index: String,
}

impl SearchAccessObserver {
    pub fn new(strategy: Arc<AdaptiveCacheStrategy>, default_index: impl Into<String>) -> Self {
        Self {
            strategy,
            default_index: default_index.into(),
        }
    }
}

#[async_trait]
impl Notifiable for SearchAccessObserver {
    async fn on_event(&self, signal: &Signal) -> Result<(), ObserverError> {
        let Some(search) = signal.data.as_search() else {
            return Ok(());
        };
        let Some(query) = search.query.as_deref() else {
            trace!("[ACCESS] search signal {} has no query", signal.id);
            return Ok(());
        };

        let index = search.index.as_deref().unwrap_or(&self.default_index);
        self.strategy.update_query_pattern(
            index,
            query,
            search.response_time_ms.unwrap_or(0.0),
            search.cache_hit.unwrap_or(false),
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "search_access"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_cache::{CacheConfig, cache_key};
    use pulse_clock::ManualClock;
    use pulse_core::{SearchData, SignalData, SignalType};

    fn observer() -> (SearchAccessObserver, Arc<AdaptiveCacheStrategy>) {
        let strategy = Arc::new(AdaptiveCacheStrategy::new(
            CacheConfig::default(),
            ManualClock::new(None),
        ));
        (SearchAccessObserver::new(strategy.clone(), "docs"), strategy)
    }

    fn search(index: Option<&str>, query: Option<&str>, cache_hit: bool) -> Signal {
        Signal::builder(
            SignalData::Search(SearchData {
                index: index.map(str::to_string),
                query: query.map(str::to_string),
                response_time_ms: Some(80.0),
                cache_hit: Some(cache_hit),
                ..Default::default()
            }),
            Utc::now(),
        )
        .build()
    }

    #[tokio::test]
    async fn test_records_access_under_signal_index() {
        let (observer, strategy) = observer();
        observer.on_event(&search(Some("products"), Some("lamp"), true)).await.unwrap();
        observer.on_event(&search(Some("products"), Some("lamp"), false)).await.unwrap();

        let pattern = strategy.query_pattern(&cache_key("products", "lamp")).unwrap();
        assert_eq!(pattern.frequency, 2);
        assert_eq!(pattern.avg_latency_ms, 80.0);
        assert_eq!(pattern.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_falls_back_to_default_index() {
        let (observer, strategy) = observer();
        observer.on_event(&search(None, Some("tokio"), false)).await.unwrap();
        assert!(strategy.query_pattern(&cache_key("docs", "tokio")).is_some());
    }

    #[tokio::test]
    async fn test_ignores_signals_without_query() {
        let (observer, strategy) = observer();
        observer.on_event(&search(None, None, false)).await.unwrap();
        observer
            .on_event(&Signal::builder(SignalData::empty(SignalType::Metric), Utc::now()).build())
            .await
            .unwrap();
        assert_eq!(strategy.tracked_len(), 0);
    }
}
