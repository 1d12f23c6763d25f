use chrono::Utc;
use pulse_core::Timestamp;
use pulse_ports::Clock;
use std::sync::Arc;

/// Wall-clock time, for everything outside tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }

    /// A system clock behind the [`Clock`] port, ready to inject
    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "system"
    }
}
