//! Circuit Breaker
//!
//! Tracks consecutive failures of a protected operation.
//!
//! States:
//! - Closed: calls proceed normally
//! - Open: failure threshold reached; callers should skip the protected call
//!
//! The breaker closes itself once the reset timeout has elapsed since it
//! opened. The check is lazy: it happens on the next [`CircuitBreaker::is_open`].

use chrono::Duration;
use log::{info, warn};
use parking_lot::Mutex;
use pulse_core::Timestamp;
use pulse_ports::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Too many consecutive failures - skip the protected call
    Open,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Time after opening before the circuit closes again (ms)
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000, // 30 seconds
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    failure_count: u32,
    state: CircuitState,
    opened_at: Option<Timestamp>,
}

/// Failure-isolation state machine for one protected resource
///
/// All methods take `&self`; state reads and writes happen inside one short
/// critical section per call, so the breaker can be shared across tasks.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(BreakerState {
                failure_count: 0,
                state: CircuitState::Closed,
                opened_at: None,
            }),
        }
    }

    /// Record a failed call
    ///
    /// Opens the circuit once the failure count reaches the threshold. Every
    /// failure at or past the threshold refreshes the open time.
    pub fn on_error(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);

        if inner.failure_count >= self.config.failure_threshold {
            if inner.state == CircuitState::Closed {
                warn!(
                    "[BREAKER] {} opened after {} consecutive failures",
                    self.name, inner.failure_count
                );
            }
            inner.state = CircuitState::Open;
            inner.opened_at = Some(now);
        }
    }

    /// Record a successful call: clears failures and closes the circuit
    pub fn on_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::Open {
            info!("[BREAKER] {} closed after successful call", self.name);
        }
        inner.failure_count = 0;
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
    }

    /// Whether callers should currently skip the protected operation
    ///
    /// An open circuit whose reset timeout has elapsed transitions back to
    /// closed here and reports `false`.
    pub fn is_open(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.state == CircuitState::Open {
            let reset_after = Duration::milliseconds(self.config.reset_timeout_ms as i64);
            let elapsed = inner.opened_at.map(|opened| now - opened);

            if elapsed.is_none_or(|elapsed| elapsed >= reset_after) {
                info!("[BREAKER] {} reset after timeout", self.name);
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.opened_at = None;
            }
        }

        inner.state == CircuitState::Open
    }

    /// Current state without applying the lazy reset
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}
