//! Time-based signal processor
//!
//! Annotates signals with calendar features and watches batches for
//! latency and business-hours regularities.

use super::{MIN_PATTERN_BATCH, feature_average, flag_share, supporting};
use chrono::{Datelike, FixedOffset, Offset, Timelike, Utc};
use log::{debug, warn};
use pulse_core::{Features, Pattern, PatternType, Signal};
use pulse_ports::{ProcessingResult, SignalProcessor};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub const TIME_PROCESSOR_ID: &str = "time_based";

const HIGH_LATENCY_CONFIDENCE: f64 = 0.8;
const BUSINESS_HOURS_CONFIDENCE: f64 = 0.6;
const BUSINESS_HOURS_BOOST: f64 = 1.5;

/// Time processor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeProcessorConfig {
    /// Offset from UTC used for hour and weekday features
    pub utc_offset_minutes: i32,
    /// First business hour (inclusive)
    pub business_hours_start: u32,
    /// Last business hour (exclusive)
    pub business_hours_end: u32,
    /// Average response time above which a batch is flagged as slow
    pub latency_threshold_ms: f64,
    /// Share of business-hours signals above which a batch is flagged
    pub business_hours_share_threshold: f64,
}

impl Default for TimeProcessorConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            business_hours_start: 9,
            business_hours_end: 17,
            latency_threshold_ms: 100.0,
            business_hours_share_threshold: 0.7,
        }
    }
}

/// Processor deriving calendar features from signal timestamps
pub struct TimeBasedProcessor {
    config: TimeProcessorConfig,
    offset: FixedOffset,
    signals_seen: AtomicU64,
}

impl TimeBasedProcessor {
    pub fn new(config: TimeProcessorConfig) -> Self {
        let offset = match FixedOffset::east_opt(config.utc_offset_minutes * 60) {
            Some(offset) => offset,
            None => {
                warn!(
                    "[TIME] utc offset {} min out of range, using UTC",
                    config.utc_offset_minutes
                );
                Utc.fix()
            }
        };

        Self {
            config,
            offset,
            signals_seen: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &TimeProcessorConfig {
        &self.config
    }

    /// Number of signals passed to `process_signal` so far
    pub fn signals_seen(&self) -> u64 {
        self.signals_seen.load(Ordering::Relaxed)
    }

    fn is_business_hour(&self, hour: u32) -> bool {
        hour >= self.config.business_hours_start && hour < self.config.business_hours_end
    }

    fn local_hour(&self, signal: &Signal) -> u32 {
        signal.timestamp.with_timezone(&self.offset).hour()
    }
}

impl Default for TimeBasedProcessor {
    fn default() -> Self {
        Self::new(TimeProcessorConfig::default())
    }
}

impl SignalProcessor for TimeBasedProcessor {
    fn processor_id(&self) -> &str {
        TIME_PROCESSOR_ID
    }

    fn process_signal(&self, signal: &Signal) -> ProcessingResult<Option<Signal>> {
        self.signals_seen.fetch_add(1, Ordering::Relaxed);
        let features = self.extract_features(signal);
        let priority = self.prioritize(signal);
        Ok(Some(signal.processed_copy(features, priority)))
    }

    fn extract_features(&self, signal: &Signal) -> Features {
        let local = signal.timestamp.with_timezone(&self.offset);
        let hour = local.hour();
        let day_of_week = local.weekday().num_days_from_sunday();

        let mut features = Features::new();
        features.set("hour", hour as f64);
        features.set("day_of_week", day_of_week as f64);
        features.set_flag("is_weekend", day_of_week == 0 || day_of_week == 6);
        features.set_flag("is_business_hours", self.is_business_hour(hour));
        features.set("response_time", signal.data.response_time_ms().unwrap_or(0.0));
        features.set("strength", signal.strength);
        features.set("value", signal.value);
        features
    }

    fn detect_patterns(&self, signals: &[Signal]) -> ProcessingResult<Vec<Pattern>> {
        if signals.len() < MIN_PATTERN_BATCH {
            return Ok(Vec::new());
        }

        let features: Vec<Features> = signals.iter().map(|s| self.extract_features(s)).collect();
        let mut patterns = Vec::new();

        let avg_latency = feature_average(&features, "response_time");
        if avg_latency > self.config.latency_threshold_ms {
            debug!("[TIME] high latency over {} signals: {:.1}ms", signals.len(), avg_latency);
            patterns.push(Pattern::new(
                "time.high_latency",
                PatternType::Performance,
                signals,
                HIGH_LATENCY_CONFIDENCE,
                avg_latency,
            ));
        }

        let business_share = flag_share(&features, "is_business_hours");
        if business_share > self.config.business_hours_share_threshold {
            let in_hours = supporting(signals, &features, |f| {
                f.flag("is_business_hours").unwrap_or(false)
            });
            patterns.push(Pattern::new(
                "time.business_hours_concentration",
                PatternType::Temporal,
                in_hours,
                BUSINESS_HOURS_CONFIDENCE,
                business_share,
            ));
        }

        Ok(patterns)
    }

    fn prioritize(&self, signal: &Signal) -> f64 {
        if self.is_business_hour(self.local_hour(signal)) {
            (signal.strength * BUSINESS_HOURS_BOOST).min(1.0)
        } else {
            signal.strength
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pulse_core::{MetricData, SignalData, SignalType, Timestamp};

    fn at(hour: u32) -> Timestamp {
        // 2024-03-13 is a Wednesday
        Utc.with_ymd_and_hms(2024, 3, 13, hour, 30, 0).unwrap()
    }

    fn metric(timestamp: Timestamp, strength: f64, response_time_ms: Option<f64>) -> Signal {
        Signal::builder(
            SignalData::Metric(MetricData {
                response_time_ms,
                ..Default::default()
            }),
            timestamp,
        )
        .strength(strength)
        .value(3.0)
        .build()
    }

    #[test]
    fn test_calendar_features() {
        let processor = TimeBasedProcessor::default();
        let features = processor.extract_features(&metric(at(10), 0.4, Some(42.0)));

        assert_eq!(features.get("hour"), Some(10.0));
        assert_eq!(features.get("day_of_week"), Some(3.0));
        assert_eq!(features.flag("is_weekend"), Some(false));
        assert_eq!(features.flag("is_business_hours"), Some(true));
        assert_eq!(features.get("response_time"), Some(42.0));
        assert_eq!(features.get("strength"), Some(0.4));
        assert_eq!(features.get("value"), Some(3.0));
    }

    #[test]
    fn test_features_are_total() {
        let processor = TimeBasedProcessor::default();
        let sunday = Utc.with_ymd_and_hms(2024, 3, 17, 20, 0, 0).unwrap();
        let signal = Signal::builder(SignalData::empty(SignalType::Feedback), sunday).build();

        let features = processor.extract_features(&signal);
        assert_eq!(features.get("response_time"), Some(0.0));
        assert_eq!(features.get("day_of_week"), Some(0.0));
        assert_eq!(features.flag("is_weekend"), Some(true));
        assert_eq!(features.flag("is_business_hours"), Some(false));
    }

    #[test]
    fn test_business_hours_window() {
        let processor = TimeBasedProcessor::default();
        assert_eq!(processor.extract_features(&metric(at(9), 0.5, None)).flag("is_business_hours"), Some(true));
        assert_eq!(processor.extract_features(&metric(at(16), 0.5, None)).flag("is_business_hours"), Some(true));
        assert_eq!(processor.extract_features(&metric(at(17), 0.5, None)).flag("is_business_hours"), Some(false));
        assert_eq!(processor.extract_features(&metric(at(8), 0.5, None)).flag("is_business_hours"), Some(false));
    }

    #[test]
    fn test_offset_shifts_local_hour() {
        let processor = TimeBasedProcessor::new(TimeProcessorConfig {
            utc_offset_minutes: -300,
            ..Default::default()
        });
        // 12:30 UTC is 07:30 at UTC-5
        let features = processor.extract_features(&metric(at(12), 0.5, None));
        assert_eq!(features.get("hour"), Some(7.0));
        assert_eq!(features.flag("is_business_hours"), Some(false));
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let processor = TimeBasedProcessor::new(TimeProcessorConfig {
            utc_offset_minutes: 100_000,
            ..Default::default()
        });
        assert_eq!(processor.extract_features(&metric(at(12), 0.5, None)).get("hour"), Some(12.0));
    }

    #[test]
    fn test_priority_boosted_in_business_hours() {
        let processor = TimeBasedProcessor::default();
        assert!((processor.prioritize(&metric(at(10), 0.4, None)) - 0.6).abs() < 1e-9);
        assert_eq!(processor.prioritize(&metric(at(10), 0.9, None)), 1.0);
        assert_eq!(processor.prioritize(&metric(at(22), 0.4, None)), 0.4);
    }

    #[test]
    fn test_process_signal_returns_processed_copy() {
        let processor = TimeBasedProcessor::default();
        let signal = metric(at(10), 0.4, Some(20.0));

        let processed = processor.process_signal(&signal).unwrap().unwrap();
        assert!(processed.processed);
        assert!(!signal.processed);
        assert_eq!(processed.id, signal.id);
        assert_eq!(processed.features.get("hour"), Some(10.0));
        assert!((processed.priority - 0.6).abs() < 1e-9);
        assert_eq!(processor.signals_seen(), 1);
    }

    #[test]
    fn test_single_signal_yields_no_patterns() {
        let processor = TimeBasedProcessor::default();
        let patterns = processor
            .detect_patterns(&[metric(at(10), 0.5, Some(500.0))])
            .unwrap();
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_high_latency_pattern() {
        let processor = TimeBasedProcessor::default();
        let batch = vec![
            metric(at(2), 0.5, Some(150.0)),
            metric(at(3), 0.5, Some(120.0)),
            metric(at(4), 0.5, Some(60.0)),
        ];

        let patterns = processor.detect_patterns(&batch).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_id, "time.high_latency");
        assert_eq!(patterns[0].pattern_type, PatternType::Performance);
        assert_eq!(patterns[0].confidence, 0.8);
        assert_eq!(patterns[0].frequency, 3);
        assert!((patterns[0].observed_value - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_business_hours_concentration_pattern() {
        let processor = TimeBasedProcessor::default();
        let batch = vec![
            metric(at(9), 0.5, Some(10.0)),
            metric(at(11), 0.5, Some(10.0)),
            metric(at(14), 0.5, Some(10.0)),
            metric(at(16), 0.5, Some(10.0)),
            metric(at(20), 0.5, Some(10.0)),
        ];

        let patterns = processor.detect_patterns(&batch).unwrap();
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.pattern_id, "time.business_hours_concentration");
        assert_eq!(pattern.pattern_type, PatternType::Temporal);
        assert_eq!(pattern.confidence, 0.6);
        assert_eq!(pattern.frequency, 4);
        assert!((pattern.observed_value - 0.8).abs() < 1e-9);
    }
}
