//! Cache service
//!
//! Read-through helpers for search results plus proactive warming of hot
//! queries. All store traffic is retried with backoff; persistent store
//! failures degrade to misses and skipped writes.
//!
//! Every read is recorded on the strategy as one access of its query, with
//! the read latency and whether a live entry came back. Writes only refresh
//! the query's `last_accessed`.

use crate::strategy::{AdaptiveCacheStrategy, CacheConfig, TrackedQuery, cache_key};
use futures_util::future::join_all;
use log::{debug, error, info, warn};
use priority_queue::PriorityQueue;
use pulse_clock::SystemClock;
use pulse_core::Timestamp;
use pulse_ports::{CacheStore, Clock, SearchClient, SearchRequest, SearchResults};
use pulse_resilience::{
    CircuitBreaker, CircuitBreakerConfig, ConcurrencyQueue, retry_with_backoff, with_timeout,
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const HEALTH_CHECK_KEY: &str = "pulse:health";

/// Search results served from the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSearchResults {
    pub results: SearchResults,
    /// Always `true` for values returned by the cache
    pub cached: bool,
    pub cached_at: Timestamp,
}

/// Serialized form of a cache entry
#[derive(Serialize, Deserialize)]
struct CacheEntry {
    results: SearchResults,
    cached_at: Timestamp,
}

/// Which tracked queries a warming run considers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmScope {
    All,
    Index(String),
}

impl WarmScope {
    fn index(&self) -> Option<&str> {
        match self {
            WarmScope::All => None,
            WarmScope::Index(index) => Some(index),
        }
    }
}

/// Outcome of a warming run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    /// Hot queries in scope
    pub candidates: usize,
    /// Candidates that already had a live cache entry
    pub already_cached: usize,
    /// Candidates refreshed from the search backend
    pub revalidated: usize,
    /// Candidates skipped because the circuit was open
    pub skipped_circuit_open: usize,
    pub failed: usize,
}

/// Cache counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Store calls that still failed after retrying
    pub store_errors: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    store_errors: AtomicU64,
}

enum WarmOutcome {
    Revalidated,
    CircuitOpen,
    Failed,
}

/// Adaptive search-result cache
pub struct CacheService {
    config: CacheConfig,
    strategy: Arc<AdaptiveCacheStrategy>,
    store: Arc<dyn CacheStore>,
    search: Arc<dyn SearchClient>,
    queue: Arc<ConcurrencyQueue>,
    breaker: Arc<CircuitBreaker>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl CacheService {
    pub fn builder(store: Arc<dyn CacheStore>, search: Arc<dyn SearchClient>) -> CacheServiceBuilder {
        CacheServiceBuilder::new(store, search)
    }

    pub fn strategy(&self) -> &Arc<AdaptiveCacheStrategy> {
        &self.strategy
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn queue(&self) -> &Arc<ConcurrencyQueue> {
        &self.queue
    }

    /// Store `results` for a query with a TTL derived from its access pattern
    pub async fn cache_search_results(&self, index: &str, query: &str, results: &SearchResults) {
        let key = cache_key(index, query);
        let strategy = self.strategy.determine_optimal_cache_strategy(&key);
        let entry = CacheEntry {
            results: results.clone(),
            cached_at: self.clock.now(),
        };

        let value = match serde_json::to_string(&entry) {
            Ok(value) => value,
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                error!("[CACHE] failed to serialize results for {}: {}", key, e);
                return;
            }
        };

        let store = &self.store;
        let written = retry_with_backoff(&self.config.retry, "cache set", || {
            store.set(&key, value.clone(), strategy.ttl)
        })
        .await;

        match written {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                self.strategy.touch(index, query);
                debug!("[CACHE] cached {} for {:?}", key, strategy.ttl);
            }
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!("[CACHE] skipping write of {}: {}", key, e);
            }
        }
    }

    /// Cached results for a query, if a live entry exists
    ///
    /// Hits and misses alike count as one access of the query.
    pub async fn get_search_results(&self, index: &str, query: &str) -> Option<CachedSearchResults> {
        let key = cache_key(index, query);
        let started = Instant::now();
        let found = self.lookup(&key).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.strategy
            .update_query_pattern(index, query, latency_ms, found.is_some());
        found
    }

    async fn lookup(&self, key: &str) -> Option<CachedSearchResults> {
        let Some(raw) = self.read(key).await else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(CachedSearchResults {
                    results: entry.results,
                    cached: true,
                    cached_at: entry.cached_at,
                })
            }
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                warn!("[CACHE] discarding unreadable entry {}: {}", key, e);
                None
            }
        }
    }

    /// Refresh hot queries that are not currently cached
    ///
    /// Candidates are revalidated highest priority first, each through the
    /// concurrency queue. While the circuit breaker is open the remaining
    /// candidates are skipped. Failures are logged and counted.
    pub async fn warm_cache(&self, scope: WarmScope) -> WarmReport {
        let mut candidates = self.strategy.revalidation_candidates(scope.index());
        candidates.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.query.cmp(&b.query)));

        let mut report = WarmReport {
            candidates: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            debug!("[CACHE] nothing to warm for {:?}", scope);
            return report;
        }

        let mut by_priority = PriorityQueue::new();
        for (position, candidate) in candidates.iter().enumerate() {
            let priority = self.strategy.strategy_for(&candidate.pattern).priority;
            by_priority.push(position, (priority, Reverse(position)));
        }

        let mut pending = Vec::with_capacity(candidates.len());
        while let Some((position, _)) = by_priority.pop() {
            let candidate = &candidates[position];
            if self.read(&candidate.key()).await.is_some() {
                report.already_cached += 1;
            } else {
                pending.push(candidate.clone());
            }
        }

        let outcomes = join_all(pending.into_iter().map(|candidate| self.revalidate(candidate))).await;
        for outcome in outcomes {
            match outcome {
                WarmOutcome::Revalidated => report.revalidated += 1,
                WarmOutcome::CircuitOpen => report.skipped_circuit_open += 1,
                WarmOutcome::Failed => report.failed += 1,
            }
        }

        info!(
            "[CACHE] warmed {:?}: {} candidates, {} cached, {} revalidated, {} skipped, {} failed",
            scope,
            report.candidates,
            report.already_cached,
            report.revalidated,
            report.skipped_circuit_open,
            report.failed
        );
        report
    }

    /// Delete every cache entry whose key matches `pattern`
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate(&self, pattern: &str) -> usize {
        let store = &self.store;
        let keys = match retry_with_backoff(&self.config.retry, "cache keys", || store.keys(pattern)).await {
            Ok(keys) => keys,
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!("[CACHE] cannot list keys for {}: {}", pattern, e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in &keys {
            match retry_with_backoff(&self.config.retry, "cache delete", || store.delete(key)).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("[CACHE] failed to delete {}: {}", key, e);
                }
            }
        }

        info!("[CACHE] invalidated {} of {} keys matching {}", removed, keys.len(), pattern);
        removed
    }

    /// Drop every cached result of one index
    pub async fn invalidate_index(&self, index: &str) -> usize {
        self.invalidate(&cache_key(index, "*")).await
    }

    /// Whether the store answers a read within `timeout`
    pub async fn health_check(&self, timeout: Duration) -> bool {
        match with_timeout(timeout, self.store.get(HEALTH_CHECK_KEY)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("[CACHE] health check failed: {}", e);
                false
            }
            Err(e) => {
                warn!("[CACHE] health check failed: {}", e);
                false
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            store_errors: self.counters.store_errors.load(Ordering::Relaxed),
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        let store = &self.store;
        match retry_with_backoff(&self.config.retry, "cache get", || store.get(key)).await {
            Ok(value) => value,
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!("[CACHE] treating {} as a miss: {}", key, e);
                None
            }
        }
    }

    async fn revalidate(&self, candidate: TrackedQuery) -> WarmOutcome {
        let key = candidate.key();
        let queued = self
            .queue
            .add(|| async move {
                if self.breaker.is_open() {
                    debug!("[CACHE] circuit open, skipping {}", candidate.key());
                    return WarmOutcome::CircuitOpen;
                }

                let request = SearchRequest {
                    index: candidate.index.clone(),
                    query: candidate.query.clone(),
                    force_fresh: true,
                };
                match self.search.search(request).await {
                    Ok(results) => {
                        self.breaker.on_success();
                        self.cache_search_results(&candidate.index, &candidate.query, &results)
                            .await;
                        WarmOutcome::Revalidated
                    }
                    Err(e) => {
                        self.breaker.on_error();
                        warn!("[CACHE] revalidation of {} failed: {}", candidate.key(), e);
                        WarmOutcome::Failed
                    }
                }
            })
            .await;

        queued.unwrap_or_else(|e| {
            warn!("[CACHE] could not schedule {}: {}", key, e);
            WarmOutcome::Failed
        })
    }
}

/// Builder for [`CacheService`]
///
/// Anything not supplied gets a private default: a system clock, a
/// default-sized queue and a breaker named `search`.
pub struct CacheServiceBuilder {
    store: Arc<dyn CacheStore>,
    search: Arc<dyn SearchClient>,
    config: CacheConfig,
    clock: Option<Arc<dyn Clock>>,
    strategy: Option<Arc<AdaptiveCacheStrategy>>,
    queue: Option<Arc<ConcurrencyQueue>>,
    breaker: Option<Arc<CircuitBreaker>>,
}

impl CacheServiceBuilder {
    pub fn new(store: Arc<dyn CacheStore>, search: Arc<dyn SearchClient>) -> Self {
        Self {
            store,
            search,
            config: CacheConfig::default(),
            clock: None,
            strategy: None,
            queue: None,
            breaker: None,
        }
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing strategy instead of creating one from the config
    pub fn strategy(mut self, strategy: Arc<AdaptiveCacheStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn queue(mut self, queue: Arc<ConcurrencyQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn build(self) -> CacheService {
        let clock = self
            .clock
            .unwrap_or_else(SystemClock::shared);
        let strategy = self
            .strategy
            .unwrap_or_else(|| Arc::new(AdaptiveCacheStrategy::new(self.config.clone(), clock.clone())));
        let breaker = self.breaker.unwrap_or_else(|| {
            Arc::new(CircuitBreaker::new(
                "search",
                CircuitBreakerConfig::default(),
                clock.clone(),
            ))
        });

        CacheService {
            config: self.config,
            strategy,
            store: self.store,
            search: self.search,
            queue: self.queue.unwrap_or_default(),
            breaker,
            clock,
            counters: Counters::default(),
        }
    }
}
