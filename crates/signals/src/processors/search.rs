//! Search signal processor

use super::{MIN_PATTERN_BATCH, feature_average, flag_share, supporting};
use log::{debug, warn};
use pulse_core::{Features, Pattern, PatternType, SearchData, Signal};
use pulse_ports::{ProcessingError, ProcessingResult, SignalProcessor};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub const SEARCH_PROCESSOR_ID: &str = "search";

const HIGH_RELEVANCE_CONFIDENCE: f64 = 0.85;
const SLOW_SEARCH_CONFIDENCE: f64 = 0.8;
const ZERO_RESULTS_CONFIDENCE: f64 = 0.7;

/// Search processor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchProcessorConfig {
    /// Average relevance above which a batch is flagged as high quality
    pub relevance_threshold: f64,
    /// Response time above which a single search counts as slow
    pub latency_threshold_ms: f64,
    /// Share of empty result sets above which a batch is flagged
    pub zero_result_share_threshold: f64,
}

impl Default for SearchProcessorConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.7,
            latency_threshold_ms: 100.0,
            zero_result_share_threshold: 0.5,
        }
    }
}

/// Processor for search signals
///
/// Ignores every other signal type. Search signals without a query are
/// logged and dropped.
pub struct SearchSignalProcessor {
    config: SearchProcessorConfig,
    signals_seen: AtomicU64,
    searches_processed: AtomicU64,
}

impl SearchSignalProcessor {
    pub fn new(config: SearchProcessorConfig) -> Self {
        Self {
            config,
            signals_seen: AtomicU64::new(0),
            searches_processed: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SearchProcessorConfig {
        &self.config
    }

    /// Signals offered to this processor, of any type
    pub fn signals_seen(&self) -> u64 {
        self.signals_seen.load(Ordering::Relaxed)
    }

    /// Search signals turned into processed copies
    pub fn searches_processed(&self) -> u64 {
        self.searches_processed.load(Ordering::Relaxed)
    }

    fn query<'a>(signal: &Signal, search: &'a SearchData) -> ProcessingResult<&'a str> {
        search
            .query
            .as_deref()
            .ok_or_else(|| ProcessingError::MissingMetadata {
                signal_id: signal.id.to_string(),
                field: "query".to_string(),
            })
    }
}

impl Default for SearchSignalProcessor {
    fn default() -> Self {
        Self::new(SearchProcessorConfig::default())
    }
}

impl SignalProcessor for SearchSignalProcessor {
    fn processor_id(&self) -> &str {
        SEARCH_PROCESSOR_ID
    }

    fn process_signal(&self, signal: &Signal) -> ProcessingResult<Option<Signal>> {
        self.signals_seen.fetch_add(1, Ordering::Relaxed);

        let Some(search) = signal.data.as_search() else {
            return Ok(None);
        };
        if let Err(e) = Self::query(signal, search) {
            warn!("[SEARCH] dropping signal: {}", e);
            return Ok(None);
        }

        let features = self.extract_features(signal);
        let priority = self.prioritize(signal);
        let mut processed = signal.processed_copy(features, priority);
        processed.patterns.clear();

        self.searches_processed.fetch_add(1, Ordering::Relaxed);
        debug!("[SEARCH] processed {} (priority {:.2})", processed.id, priority);
        Ok(Some(processed))
    }

    fn extract_features(&self, signal: &Signal) -> Features {
        let default = SearchData::default();
        let search = signal.data.as_search().unwrap_or(&default);
        let result_count = search.result_count.unwrap_or(0);

        let mut features = Features::new();
        features.set(
            "query_length",
            search.query.as_deref().map_or(0, |q| q.chars().count()) as f64,
        );
        features.set("result_count", result_count as f64);
        features.set_flag("has_results", result_count > 0);
        features.set("response_time", search.response_time_ms.unwrap_or(0.0));
        features.set("relevance", search.relevance.unwrap_or(0.0));
        features.set_flag("clicked", search.clicked.unwrap_or(false));
        features.set_flag("cache_hit", search.cache_hit.unwrap_or(false));
        features
    }

    fn detect_patterns(&self, signals: &[Signal]) -> ProcessingResult<Vec<Pattern>> {
        if signals.len() < MIN_PATTERN_BATCH {
            return Ok(Vec::new());
        }

        let searches: Vec<Signal> = signals
            .iter()
            .filter(|s| s.data.as_search().is_some())
            .cloned()
            .collect();
        if searches.len() < MIN_PATTERN_BATCH {
            return Ok(Vec::new());
        }

        let features: Vec<Features> = searches.iter().map(|s| self.extract_features(s)).collect();
        let mut patterns = Vec::new();

        let avg_relevance = feature_average(&features, "relevance");
        if avg_relevance > self.config.relevance_threshold {
            patterns.push(Pattern::new(
                "search.high_relevance",
                PatternType::Quality,
                &searches,
                HIGH_RELEVANCE_CONFIDENCE,
                avg_relevance,
            ));
        }

        let avg_latency = feature_average(&features, "response_time");
        if avg_latency > self.config.latency_threshold_ms {
            patterns.push(
                Pattern::new(
                    "search.slow_search",
                    PatternType::Performance,
                    &searches,
                    SLOW_SEARCH_CONFIDENCE,
                    avg_latency,
                )
                .with_related("time.high_latency"),
            );
        }

        let empty_share = 1.0 - flag_share(&features, "has_results");
        if empty_share > self.config.zero_result_share_threshold {
            let empty = supporting(&searches, &features, |f| {
                !f.flag("has_results").unwrap_or(false)
            });
            patterns.push(Pattern::new(
                "search.zero_results",
                PatternType::Quality,
                empty,
                ZERO_RESULTS_CONFIDENCE,
                empty_share,
            ));
        }

        if !patterns.is_empty() {
            debug!(
                "[SEARCH] {} patterns over {} searches",
                patterns.len(),
                searches.len()
            );
        }
        Ok(patterns)
    }

    fn prioritize(&self, signal: &Signal) -> f64 {
        let (relevance, response_time) = signal
            .data
            .as_search()
            .map(|s| (s.relevance.unwrap_or(0.0), s.response_time_ms.unwrap_or(0.0)))
            .unwrap_or((0.0, 0.0));
        let slow = if response_time > self.config.latency_threshold_ms {
            1.0
        } else {
            0.0
        };

        (0.5 * signal.strength + 0.3 * relevance + 0.2 * slow).min(1.0)
    }
}
