//! Signal Coordinator
//!
//! Binds processor instances to routing criteria and fans each signal out
//! to every processor that accepts it. Processor failures are logged and
//! skipped; the coordinator itself never fails.

use crate::router::{ProcessorCriteria, SignalRouter};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use pulse_core::{Pattern, Signal};
use pulse_ports::{Notifiable, ObserverError, SignalProcessor};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Number of most recent signals kept for pattern sweeps, and of
    /// processed copies kept from observed signals
    pub history_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
        }
    }
}

/// Coordinator counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    /// Signals passed to `process_signal`
    pub signals_received: u64,
    /// Processed copies returned by processors
    pub signals_processed: u64,
    /// Processor calls that returned an error
    pub processor_failures: u64,
}

#[derive(Default)]
struct Registry {
    router: SignalRouter,
    processors: IndexMap<String, Arc<dyn SignalProcessor>>,
}

/// Routes signals to processors and aggregates their output
pub struct SignalCoordinator {
    config: CoordinatorConfig,
    registry: RwLock<Registry>,
    history: Mutex<VecDeque<Signal>>,
    processed: Mutex<VecDeque<Signal>>,
    signals_received: AtomicU64,
    signals_processed: AtomicU64,
    processor_failures: AtomicU64,
}

impl SignalCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(config.history_capacity.min(1024))),
            processed: Mutex::new(VecDeque::with_capacity(config.history_capacity.min(1024))),
            config,
            registry: RwLock::new(Registry::default()),
            signals_received: AtomicU64::new(0),
            signals_processed: AtomicU64::new(0),
            processor_failures: AtomicU64::new(0),
        }
    }

    /// Bind `processor` to `criteria` under its own processor id
    ///
    /// Registering another processor with the same id replaces the earlier
    /// instance and its criteria.
    pub fn register_processor(&self, processor: Arc<dyn SignalProcessor>, criteria: ProcessorCriteria) {
        let processor_id = processor.processor_id().to_string();
        let mut registry = self.registry.write();
        registry.router.register_processor(processor_id.clone(), criteria);
        if registry.processors.insert(processor_id.clone(), processor).is_some() {
            warn!("[COORDINATOR] replaced processor {}", processor_id);
        } else {
            info!("[COORDINATOR] registered processor {}", processor_id);
        }
    }

    pub fn unregister_processor(&self, processor_id: &str) -> bool {
        let mut registry = self.registry.write();
        registry.router.unregister_processor(processor_id);
        registry.processors.shift_remove(processor_id).is_some()
    }

    /// Run every processor whose criteria accept `signal`
    ///
    /// Returns the processed copies in registration order. Processors that
    /// ignore the signal or fail contribute nothing.
    pub fn process_signal(&self, signal: &Signal) -> Vec<Signal> {
        self.signals_received.fetch_add(1, Ordering::Relaxed);
        let matched = self.matched_processors(signal);
        if matched.is_empty() {
            debug!("[COORDINATOR] no processor accepts signal {}", signal.id);
            return Vec::new();
        }

        let mut processed = Vec::with_capacity(matched.len());
        for processor in matched {
            match processor.process_signal(signal) {
                Ok(Some(copy)) => processed.push(copy),
                Ok(None) => {}
                Err(e) => {
                    self.processor_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        "[COORDINATOR] processor {} failed on signal {}: {}",
                        processor.processor_id(),
                        signal.id,
                        e
                    );
                }
            }
        }

        self.signals_processed
            .fetch_add(processed.len() as u64, Ordering::Relaxed);
        processed
    }

    pub fn process_batch(&self, signals: &[Signal]) -> Vec<Signal> {
        signals
            .iter()
            .flat_map(|signal| self.process_signal(signal))
            .collect()
    }

    /// Run pattern detection on every registered processor
    ///
    /// Routing criteria are not applied: each processor sees the whole
    /// batch. Results are concatenated in registration order without
    /// deduplication.
    pub fn detect_patterns(&self, signals: &[Signal]) -> Vec<Pattern> {
        let processors: Vec<Arc<dyn SignalProcessor>> =
            self.registry.read().processors.values().cloned().collect();

        let mut patterns = Vec::new();
        for processor in processors {
            match processor.detect_patterns(signals) {
                Ok(found) => patterns.extend(found),
                Err(e) => {
                    self.processor_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        "[COORDINATOR] pattern detection failed in {}: {}",
                        processor.processor_id(),
                        e
                    );
                }
            }
        }
        patterns
    }

    /// Pattern sweep over the signals received through `on_event`
    pub fn detect_recent_patterns(&self) -> Vec<Pattern> {
        let recent = self.recent_signals();
        self.detect_patterns(&recent)
    }

    /// Snapshot of the retained signal history, oldest first
    pub fn recent_signals(&self) -> Vec<Signal> {
        self.history.lock().iter().cloned().collect()
    }

    /// Processed copies produced for signals received through `on_event`,
    /// oldest first
    pub fn recent_processed(&self) -> Vec<Signal> {
        self.processed.lock().iter().cloned().collect()
    }

    pub fn processor_ids(&self) -> Vec<String> {
        self.registry.read().processors.keys().cloned().collect()
    }

    pub fn criteria(&self, processor_id: &str) -> Option<ProcessorCriteria> {
        self.registry.read().router.criteria(processor_id).cloned()
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            signals_received: self.signals_received.load(Ordering::Relaxed),
            signals_processed: self.signals_processed.load(Ordering::Relaxed),
            processor_failures: self.processor_failures.load(Ordering::Relaxed),
        }
    }

    fn matched_processors(&self, signal: &Signal) -> Vec<Arc<dyn SignalProcessor>> {
        let registry = self.registry.read();
        registry
            .router
            .match_signal(signal)
            .iter()
            .filter_map(|id| registry.processors.get(id).cloned())
            .collect()
    }

    fn remember(&self, buffer: &Mutex<VecDeque<Signal>>, signals: impl IntoIterator<Item = Signal>) {
        let capacity = self.config.history_capacity;
        if capacity == 0 {
            return;
        }
        let mut buffer = buffer.lock();
        for signal in signals {
            if buffer.len() >= capacity {
                buffer.pop_front();
            }
            buffer.push_back(signal);
        }
    }
}

impl Default for SignalCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

#[async_trait]
impl Notifiable for SignalCoordinator {
    async fn on_event(&self, signal: &Signal) -> Result<(), ObserverError> {
        self.remember(&self.history, [signal.clone()]);
        let processed = self.process_signal(signal);
        debug!(
            "[COORDINATOR] signal {} produced {} processed copies",
            signal.id,
            processed.len()
        );
        self.remember(&self.processed, processed);
        Ok(())
    }

    fn name(&self) -> &str {
        "signal_coordinator"
    }
}
