use crate::error::ProcessingResult;
use pulse_core::{Features, Pattern, Signal};

/// Port for signal processors
///
/// A processor extracts features from individual signals and detects
/// patterns over batches. Processors are stateless with respect to routing
/// (the coordinator decides which signals reach them) but may keep internal
/// aggregation state such as running counters.
pub trait SignalProcessor: Send + Sync {
    /// Stable identifier used for routing and logging
    fn processor_id(&self) -> &str;

    /// Process a single signal
    ///
    /// Returns `Ok(None)` when the processor deliberately ignores the signal,
    /// or a processed copy of it otherwise.
    fn process_signal(&self, signal: &Signal) -> ProcessingResult<Option<Signal>>;

    /// Process a batch of signals, dropping ignored ones
    fn process_batch(&self, signals: &[Signal]) -> ProcessingResult<Vec<Signal>> {
        let mut processed = Vec::with_capacity(signals.len());
        for signal in signals {
            if let Some(result) = self.process_signal(signal)? {
                processed.push(result);
            }
        }
        Ok(processed)
    }

    /// Extract features from a signal
    ///
    /// Must be total: missing metadata yields zero/false feature values.
    fn extract_features(&self, signal: &Signal) -> Features;

    /// Detect patterns over a batch of signals
    ///
    /// Fewer than two signals never yield a pattern.
    fn detect_patterns(&self, signals: &[Signal]) -> ProcessingResult<Vec<Pattern>>;

    /// Priority score assigned to a processed signal
    fn prioritize(&self, signal: &Signal) -> f64;
}
