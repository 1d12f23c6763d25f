//! Event Collector
//!
//! The outward-facing ingestion point. Validates incoming events, queues
//! them in arrival order, and notifies the observers registered for each
//! event's type.
//!
//! Draining is shared: the first `collect` that finds the collector idle
//! drains the queue (including events appended by concurrent callers while
//! it runs); everyone else just enqueues and returns.

use crate::error::CollectError;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use futures_util::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use pulse_core::{Signal, SignalData, SignalType, Timestamp};
use pulse_ports::Notifiable;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Collector counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    /// Events accepted and queued
    pub collected: u64,
    /// Events rejected by validation
    pub rejected: u64,
    /// Successful observer notifications
    pub notifications: u64,
    /// Observer notifications that returned an error
    pub notification_failures: u64,
}

#[derive(Default)]
struct Counters {
    collected: AtomicU64,
    rejected: AtomicU64,
    notifications: AtomicU64,
    notification_failures: AtomicU64,
}

#[derive(Default)]
struct DrainQueue {
    events: VecDeque<Signal>,
    draining: bool,
}

/// Clears the draining flag if a drain is abandoned midway (its future dropped)
struct DrainGuard<'a> {
    queue: &'a Mutex<DrainQueue>,
    finished: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.queue.lock().draining = false;
        }
    }
}

/// Validating, order-preserving event dispatcher
pub struct EventCollector {
    observers: DashMap<SignalType, Vec<Arc<dyn Notifiable>>>,
    queue: Mutex<DrainQueue>,
    counters: Counters,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            observers: DashMap::new(),
            queue: Mutex::new(DrainQueue::default()),
            counters: Counters::default(),
        }
    }

    /// Register an observer for a signal type
    ///
    /// Registering the same observer (by identity) twice for one type is a
    /// no-op. Returns whether the observer was added.
    pub fn register(&self, signal_type: SignalType, observer: Arc<dyn Notifiable>) -> bool {
        let mut entry = self.observers.entry(signal_type).or_default();
        if entry.iter().any(|existing| same_observer(existing, &observer)) {
            debug!(
                "[COLLECTOR] observer {} already registered for {}",
                observer.name(),
                signal_type
            );
            return false;
        }

        info!(
            "[COLLECTOR] registered observer {} for {}",
            observer.name(),
            signal_type
        );
        entry.push(observer);
        true
    }

    /// Remove an observer from a signal type
    ///
    /// Removing an absent observer is a no-op. A type left without observers
    /// is dropped. Returns whether the observer was removed.
    pub fn remove(&self, signal_type: SignalType, observer: &Arc<dyn Notifiable>) -> bool {
        let (removed, now_empty) = match self.observers.get_mut(&signal_type) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|existing| !same_observer(existing, observer));
                (entry.len() < before, entry.is_empty())
            }
            None => (false, false),
        };

        if now_empty {
            self.observers
                .remove_if(&signal_type, |_, observers| observers.is_empty());
        }
        if removed {
            info!(
                "[COLLECTOR] removed observer {} from {}",
                observer.name(),
                signal_type
            );
        }
        removed
    }

    /// Validate a raw event and dispatch it
    ///
    /// Fails fast on malformed input; the event is then never queued. Once
    /// an event is accepted, observer failures are logged, not returned.
    pub async fn collect(&self, event: Value) -> Result<(), CollectError> {
        let signal = match decode_event(&event) {
            Ok(signal) => signal,
            Err(e) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("[COLLECTOR] rejected event {}: {}", event, e);
                return Err(e);
            }
        };

        self.submit(signal).await;
        Ok(())
    }

    /// Dispatch an already-typed signal
    pub async fn submit(&self, signal: Signal) {
        let start_drain = {
            let mut queue = self.queue.lock();
            queue.events.push_back(signal);
            !std::mem::replace(&mut queue.draining, true)
        };
        self.counters.collected.fetch_add(1, Ordering::Relaxed);

        if start_drain {
            self.drain().await;
        }
    }

    async fn drain(&self) {
        let mut guard = DrainGuard {
            queue: &self.queue,
            finished: false,
        };

        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.events.pop_front() {
                    Some(signal) => signal,
                    None => {
                        queue.draining = false;
                        guard.finished = true;
                        break;
                    }
                }
            };
            self.notify(&next).await;
        }
    }

    async fn notify(&self, signal: &Signal) {
        let signal_type = signal.signal_type();
        let observers: Vec<Arc<dyn Notifiable>> = self
            .observers
            .get(&signal_type)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        if observers.is_empty() {
            debug!(
                "[COLLECTOR] no observers for {} signal {}",
                signal_type, signal.id
            );
            return;
        }

        let results = join_all(observers.iter().map(|observer| observer.on_event(signal))).await;

        for (observer, result) in observers.iter().zip(results) {
            match result {
                Ok(()) => {
                    self.counters.notifications.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.counters
                        .notification_failures
                        .fetch_add(1, Ordering::Relaxed);
                    error!(
                        "[COLLECTOR] observer {} failed on {} signal {}: {}",
                        observer.name(),
                        signal_type,
                        signal.id,
                        e
                    );
                }
            }
        }
    }

    /// Number of observers registered for a type
    pub fn observer_count(&self, signal_type: SignalType) -> usize {
        self.observers
            .get(&signal_type)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Types that currently have at least one observer, sorted
    pub fn registered_types(&self) -> Vec<SignalType> {
        let mut types: Vec<SignalType> = self.observers.iter().map(|e| *e.key()).collect();
        types.sort();
        types
    }

    /// Events waiting to be notified
    pub fn queue_len(&self) -> usize {
        self.queue.lock().events.len()
    }

    pub fn is_draining(&self) -> bool {
        self.queue.lock().draining
    }

    pub fn stats(&self) -> CollectorStats {
        CollectorStats {
            collected: self.counters.collected.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            notifications: self.counters.notifications.load(Ordering::Relaxed),
            notification_failures: self.counters.notification_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn same_observer(a: &Arc<dyn Notifiable>, b: &Arc<dyn Notifiable>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Validate a raw event and decode it into a signal
///
/// Checks run in order: object shape, type, timestamp, data.
fn decode_event(event: &Value) -> Result<Signal, CollectError> {
    let fields = event.as_object().ok_or(CollectError::NotAnObject)?;

    let signal_type = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(SignalType::parse)
        .ok_or(CollectError::InvalidType)?;

    let timestamp = fields
        .get("timestamp")
        .and_then(parse_timestamp)
        .ok_or(CollectError::InvalidTimestamp)?;

    let data = fields
        .get("data")
        .and_then(Value::as_object)
        .ok_or(CollectError::InvalidData)?;

    let mut builder = Signal::builder(SignalData::from_fields(signal_type, data), timestamp)
        .value(fields.get("value").and_then(Value::as_f64).unwrap_or(0.0))
        .strength(fields.get("strength").and_then(Value::as_f64).unwrap_or(0.0))
        .priority(fields.get("priority").and_then(Value::as_f64).unwrap_or(0.0));

    if let Some(id) = fields
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
    {
        builder = builder.id(id);
    }
    if let Some(source) = fields.get("source").and_then(Value::as_str) {
        builder = builder.source(source);
    }

    Ok(builder.build())
}

/// RFC 3339 string or integer epoch milliseconds
fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_ports::ObserverError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl CountingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifiable for CountingObserver {
        async fn on_event(&self, _signal: &Signal) -> Result<(), ObserverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    /// Observer that takes a fixed time to handle each signal
    struct SlowObserver {
        delay: std::time::Duration,
    }

    #[async_trait]
    impl Notifiable for SlowObserver {
        async fn on_event(&self, _signal: &Signal) -> Result<(), ObserverError> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    fn search_event() -> Value {
        json!({
            "id": "evt-1",
            "type": "search",
            "source": "search-api",
            "timestamp": "2024-03-04T10:15:00Z",
            "strength": 0.7,
            "data": {"query": "circuit breaker", "result_count": 4}
        })
    }

    #[test]
    fn test_decode_valid_event() {
        let signal = decode_event(&search_event()).unwrap();
        assert_eq!(signal.id.as_str(), "evt-1");
        assert_eq!(signal.source, "search-api");
        assert_eq!(signal.signal_type(), SignalType::Search);
        assert_eq!(signal.strength, 0.7);
        assert_eq!(
            signal.data.as_search().unwrap().query.as_deref(),
            Some("circuit breaker")
        );
    }

    #[test]
    fn test_decode_epoch_millis_timestamp() {
        let signal = decode_event(&json!({
            "type": "metric",
            "timestamp": 1_709_547_300_000i64,
            "data": {}
        }))
        .unwrap();
        assert_eq!(signal.timestamp.timestamp_millis(), 1_709_547_300_000);
        assert_eq!(signal.source, "unknown");
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            decode_event(&Value::Null).unwrap_err().to_string(),
            "Invalid event: must be an object"
        );
        assert_eq!(
            decode_event(&json!([1, 2])).unwrap_err(),
            CollectError::NotAnObject
        );
        assert_eq!(
            decode_event(&json!({"type": "weather", "timestamp": "2024-03-04T10:15:00Z", "data": {}}))
                .unwrap_err()
                .to_string(),
            "Invalid event: missing or invalid type"
        );
        assert_eq!(
            decode_event(&json!({"type": "search", "timestamp": "yesterday", "data": {}}))
                .unwrap_err()
                .to_string(),
            "Invalid event: missing or invalid timestamp"
        );
        assert_eq!(
            decode_event(&json!({"type": "search", "timestamp": "2024-03-04T10:15:00Z", "data": []}))
                .unwrap_err()
                .to_string(),
            "Invalid event: missing or invalid data"
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_notifies_once() {
        let collector = EventCollector::new();
        let observer = CountingObserver::new();
        let as_dyn: Arc<dyn Notifiable> = observer.clone();

        assert!(collector.register(SignalType::Search, as_dyn.clone()));
        assert!(!collector.register(SignalType::Search, as_dyn.clone()));
        assert_eq!(collector.observer_count(SignalType::Search), 1);

        collector.collect(search_event()).await.unwrap();
        assert_eq!(observer.calls(), 1);
    }

    #[tokio::test]
    async fn test_only_matching_type_is_notified() {
        let collector = EventCollector::new();
        let search = CountingObserver::new();
        let metric = CountingObserver::new();
        collector.register(SignalType::Search, search.clone());
        collector.register(SignalType::Metric, metric.clone());

        collector.collect(search_event()).await.unwrap();

        assert_eq!(search.calls(), 1);
        assert_eq!(metric.calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_drops_empty_type() {
        let collector = EventCollector::new();
        let observer: Arc<dyn Notifiable> = CountingObserver::new();
        let stranger: Arc<dyn Notifiable> = CountingObserver::new();

        collector.register(SignalType::Feedback, observer.clone());
        assert!(!collector.remove(SignalType::Feedback, &stranger));
        assert!(!collector.remove(SignalType::Metric, &observer));
        assert_eq!(collector.registered_types(), vec![SignalType::Feedback]);

        assert!(collector.remove(SignalType::Feedback, &observer));
        assert!(collector.registered_types().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_event_is_never_queued() {
        let collector = EventCollector::new();
        let observer = CountingObserver::new();
        collector.register(SignalType::Search, observer.clone());

        let result = collector
            .collect(json!({"type": "search", "data": {}}))
            .await;

        assert_eq!(result, Err(CollectError::InvalidTimestamp));
        assert_eq!(observer.calls(), 0);
        assert_eq!(collector.stats().rejected, 1);
        assert_eq!(collector.stats().collected, 0);
        assert_eq!(collector.queue_len(), 0);
        assert!(!collector.is_draining());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observers_of_one_event_run_concurrently() {
        let collector = EventCollector::new();
        let delay = std::time::Duration::from_millis(100);
        collector.register(SignalType::Search, Arc::new(SlowObserver { delay }));
        collector.register(SignalType::Search, Arc::new(SlowObserver { delay }));

        let started = tokio::time::Instant::now();
        collector.collect(search_event()).await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= delay);
        assert!(elapsed < delay * 2, "observers ran one after another: {:?}", elapsed);
        assert_eq!(collector.stats().notifications, 2);
    }
}
