//! Pipeline bootstrap

use crate::config::PulseConfig;
use crate::observers::SearchAccessObserver;
use log::info;
use pulse_cache::{AdaptiveCacheStrategy, CacheService, WarmReport, WarmScope};
use pulse_core::{Pattern, Signal, SignalType};
use pulse_ports::{CacheStore, Clock, Notifiable, SearchClient};
use pulse_resilience::{CircuitBreaker, ConcurrencyQueue};
use pulse_signals::{
    CollectError, EventCollector, SearchSignalProcessor, SignalCoordinator, TimeBasedProcessor,
};
use serde_json::Value;
use std::sync::Arc;

/// A fully wired signal pipeline
pub struct Pipeline {
    config: PulseConfig,
    collector: Arc<EventCollector>,
    coordinator: Arc<SignalCoordinator>,
    time_processor: Arc<TimeBasedProcessor>,
    search_processor: Arc<SearchSignalProcessor>,
    cache: Arc<CacheService>,
}

impl Pipeline {
    /// Build every component from `config` and connect them
    ///
    /// The coordinator observes every signal type; search signals are also
    /// fed to the cache's access tracking.
    pub fn bootstrap(
        config: PulseConfig,
        store: Arc<dyn CacheStore>,
        search: Arc<dyn SearchClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let time_processor = Arc::new(TimeBasedProcessor::new(config.processors.time_based.clone()));
        let search_processor = Arc::new(SearchSignalProcessor::new(config.processors.search.clone()));

        let coordinator = Arc::new(SignalCoordinator::new(config.coordinator.clone()));
        coordinator.register_processor(time_processor.clone(), config.routing.time_based.clone());
        coordinator.register_processor(search_processor.clone(), config.routing.search.clone());

        let strategy = Arc::new(AdaptiveCacheStrategy::new(config.cache.clone(), clock.clone()));
        let cache = Arc::new(
            CacheService::builder(store, search)
                .config(config.cache.clone())
                .clock(clock.clone())
                .strategy(strategy.clone())
                .queue(Arc::new(ConcurrencyQueue::new(config.queue)))
                .breaker(Arc::new(CircuitBreaker::new("search", config.breaker, clock.clone())))
                .build(),
        );

        let collector = Arc::new(EventCollector::new());
        let coordinator_observer: Arc<dyn Notifiable> = coordinator.clone();
        for signal_type in SignalType::ALL {
            collector.register(signal_type, coordinator_observer.clone());
        }
        collector.register(
            SignalType::Search,
            Arc::new(SearchAccessObserver::new(strategy, config.default_index.clone())),
        );

        info!(
            "[PIPELINE] ready: processors {:?}, queue limit {}, clock {}",
            coordinator.processor_ids(),
            config.queue.concurrent_limit,
            clock.name()
        );

        Self {
            config,
            collector,
            coordinator,
            time_processor,
            search_processor,
            cache,
        }
    }

    /// Validate and dispatch one raw event
    pub async fn ingest(&self, event: Value) -> Result<(), CollectError> {
        self.collector.collect(event).await
    }

    /// Dispatch an already-typed signal
    pub async fn submit(&self, signal: Signal) {
        self.collector.submit(signal).await
    }

    /// Patterns over the signals the coordinator has seen recently
    pub fn detect_patterns(&self) -> Vec<Pattern> {
        self.coordinator.detect_recent_patterns()
    }

    pub async fn warm_cache(&self, scope: WarmScope) -> WarmReport {
        self.cache.warm_cache(scope).await
    }

    /// Stop scheduling outbound calls; in-flight ones finish
    pub fn shutdown(&self) {
        self.cache.queue().close();
        info!("[PIPELINE] shut down");
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    pub fn collector(&self) -> &Arc<EventCollector> {
        &self.collector
    }

    pub fn coordinator(&self) -> &Arc<SignalCoordinator> {
        &self.coordinator
    }

    pub fn time_processor(&self) -> &Arc<TimeBasedProcessor> {
        &self.time_processor
    }

    pub fn search_processor(&self) -> &Arc<SearchSignalProcessor> {
        &self.search_processor
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }
}
