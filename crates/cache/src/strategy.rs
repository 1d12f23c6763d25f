//! Adaptive cache strategy
//!
//! Tracks how often each query is requested, how slow it is and how often
//! it is served from cache, and derives caching parameters from that.

use chrono::SecondsFormat;
use dashmap::DashMap;
use log::debug;
use pulse_core::Timestamp;
use pulse_ports::Clock;
use pulse_resilience::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of a query with no recorded accesses
    pub base_ttl_secs: u64,
    pub min_ttl_secs: u64,
    pub max_ttl_secs: u64,
    /// Queries requested more often than this are revalidated when warming
    pub revalidate_threshold: u64,
    /// Retry policy applied to every store call
    pub retry: RetryPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_ttl_secs: 3600,
            min_ttl_secs: 300,
            max_ttl_secs: 86_400,
            revalidate_threshold: 10,
            retry: RetryPolicy::default(),
        }
    }
}

/// Observed access statistics of one query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPattern {
    /// Number of recorded accesses
    pub frequency: u64,
    pub last_accessed: Timestamp,
    /// Running mean of response latency (ms)
    pub avg_latency_ms: f64,
    /// Running share of accesses served from cache [0, 1]
    pub hit_rate: f64,
}

/// Caching parameters derived from a query pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStrategy {
    pub ttl: Duration,
    /// Warming order; higher is warmed first
    pub priority: u64,
    /// Whether the entry should be refreshed proactively
    pub revalidate: bool,
}

/// A query the strategy has seen, with its statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedQuery {
    pub index: String,
    pub query: String,
    pub pattern: QueryPattern,
}

impl TrackedQuery {
    pub fn key(&self) -> String {
        cache_key(&self.index, &self.query)
    }
}

/// Store key of a query's cached results
pub fn cache_key(index: &str, query: &str) -> String {
    format!("search:{}:{}", index, query)
}

/// Per-query pattern tracking and TTL computation
pub struct AdaptiveCacheStrategy {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    tracked: DashMap<String, TrackedQuery>,
}

impl AdaptiveCacheStrategy {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            tracked: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Record one access of `query` on `index`
    ///
    /// Latency and hit rate are kept as running means over all accesses.
    pub fn update_query_pattern(
        &self,
        index: &str,
        query: &str,
        latency_ms: f64,
        cache_hit: bool,
    ) -> QueryPattern {
        let now = self.clock.now();
        let latency_ms = if latency_ms.is_finite() { latency_ms.max(0.0) } else { 0.0 };
        let hit = if cache_hit { 1.0 } else { 0.0 };

        let mut entry = self
            .tracked
            .entry(cache_key(index, query))
            .or_insert_with(|| TrackedQuery {
                index: index.to_string(),
                query: query.to_string(),
                pattern: QueryPattern {
                    frequency: 0,
                    last_accessed: now,
                    avg_latency_ms: 0.0,
                    hit_rate: 0.0,
                },
            });

        let pattern = {
            let pattern = &mut entry.pattern;
            pattern.frequency += 1;
            let n = pattern.frequency as f64;
            pattern.avg_latency_ms += (latency_ms - pattern.avg_latency_ms) / n;
            pattern.hit_rate += (hit - pattern.hit_rate) / n;
            pattern.last_accessed = now;
            *pattern
        };

        debug!(
            "[CACHE] {} freq={} latency={:.1}ms hit_rate={:.2} at {}",
            entry.key(),
            pattern.frequency,
            pattern.avg_latency_ms,
            pattern.hit_rate,
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        pattern
    }

    /// Refresh `last_accessed` of a tracked query without counting an access
    ///
    /// Returns `false` when the query is not tracked.
    pub fn touch(&self, index: &str, query: &str) -> bool {
        match self.tracked.get_mut(&cache_key(index, query)) {
            Some(mut tracked) => {
                tracked.pattern.last_accessed = self.clock.now();
                true
            }
            None => false,
        }
    }

    /// Caching parameters for the query stored under `key`
    ///
    /// Untracked keys are treated as never accessed.
    pub fn determine_optimal_cache_strategy(&self, key: &str) -> CacheStrategy {
        match self.tracked.get(key) {
            Some(tracked) => self.strategy_for(&tracked.pattern),
            None => self.strategy_for_counts(0, 0.0, 0.0),
        }
    }

    pub fn strategy_for(&self, pattern: &QueryPattern) -> CacheStrategy {
        self.strategy_for_counts(pattern.frequency, pattern.avg_latency_ms, pattern.hit_rate)
    }

    fn strategy_for_counts(&self, frequency: u64, avg_latency_ms: f64, hit_rate: f64) -> CacheStrategy {
        let min_ttl = self.config.min_ttl_secs as f64;
        let max_ttl = self.config.max_ttl_secs.max(self.config.min_ttl_secs) as f64;
        let frequency_f = frequency as f64;

        let scaled = (self.config.base_ttl_secs as f64 * (1.0 + frequency_f / 100.0)).min(max_ttl);
        let ttl_secs = (scaled * (0.5 + hit_rate)).round().clamp(min_ttl, max_ttl);
        let priority = (frequency_f * (1.0 + avg_latency_ms / 1000.0)).round();

        CacheStrategy {
            ttl: Duration::from_secs(ttl_secs as u64),
            priority: priority as u64,
            revalidate: frequency > self.config.revalidate_threshold,
        }
    }

    pub fn query_pattern(&self, key: &str) -> Option<QueryPattern> {
        self.tracked.get(key).map(|tracked| tracked.pattern)
    }

    /// Tracked queries due for revalidation, optionally limited to one index
    pub fn revalidation_candidates(&self, index: Option<&str>) -> Vec<TrackedQuery> {
        self.tracked
            .iter()
            .filter(|entry| entry.pattern.frequency > self.config.revalidate_threshold)
            .filter(|entry| index.is_none_or(|index| entry.index == index))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    /// Stop tracking a query; returns its last pattern
    pub fn forget(&self, key: &str) -> Option<QueryPattern> {
        self.tracked.remove(key).map(|(_, tracked)| tracked.pattern)
    }
}
