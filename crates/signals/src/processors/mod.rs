//! Built-in signal processors

mod search;
mod time_based;

pub use search::{SearchProcessorConfig, SearchSignalProcessor};
pub use time_based::{TimeBasedProcessor, TimeProcessorConfig};

use pulse_core::{Features, Signal};

/// Batches smaller than this never yield a pattern
pub(crate) const MIN_PATTERN_BATCH: usize = 2;

/// Mean of one extracted feature over a batch (missing features count as 0)
pub(crate) fn feature_average(features: &[Features], name: &str) -> f64 {
    if features.is_empty() {
        return 0.0;
    }
    let total: f64 = features.iter().map(|f| f.get(name).unwrap_or(0.0)).sum();
    total / features.len() as f64
}

/// Fraction of the batch whose features set `flag`
pub(crate) fn flag_share(features: &[Features], flag: &str) -> f64 {
    if features.is_empty() {
        return 0.0;
    }
    let set = features
        .iter()
        .filter(|f| f.flag(flag).unwrap_or(false))
        .count();
    set as f64 / features.len() as f64
}

/// Signals whose features satisfy `predicate`, in batch order
pub(crate) fn supporting<'a>(
    signals: &'a [Signal],
    features: &[Features],
    predicate: impl Fn(&Features) -> bool,
) -> Vec<&'a Signal> {
    signals
        .iter()
        .zip(features)
        .filter(|(_, f)| predicate(f))
        .map(|(signal, _)| signal)
        .collect()
}
