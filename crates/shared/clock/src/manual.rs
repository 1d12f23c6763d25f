use chrono::{Duration, Utc};
use parking_lot::RwLock;
use pulse_core::Timestamp;
use pulse_ports::Clock;
use std::sync::Arc;

/// Fixed clock that only advances when explicitly moved
///
/// Shared through an `Arc` so a test can hold one handle while the
/// component under test reads time through another.
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a new manual clock
    ///
    /// # Arguments
    /// * `initial_time` - Optional starting time. If None, uses current wall time.
    pub fn new(initial_time: Option<Timestamp>) -> Arc<Self> {
        Arc::new(Self {
            current_time: RwLock::new(initial_time.unwrap_or_else(Utc::now)),
        })
    }

    /// Advance the clock by a specified duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_time.write();
        *current += duration;
    }

    /// Explicitly set the clock time
    ///
    /// Warning: This can move time backwards. Use with caution.
    pub fn set_time(&self, time: Timestamp) {
        *self.current_time.write() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current_time.read()
    }

    fn name(&self) -> &str {
        "manual"
    }
}
