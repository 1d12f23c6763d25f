//! Pulse Resilience
//!
//! Primitives that bound concurrency and isolate repeated failures of
//! outbound calls:
//!
//! - [`CircuitBreaker`]: counts consecutive failures, opens past a threshold,
//!   closes again lazily once the reset window has elapsed. It only reports
//!   state; callers short-circuit the protected call themselves.
//! - [`ConcurrencyQueue`]: bounds the number of in-flight async tasks and
//!   queues the excess in arrival order.
//! - [`retry_with_backoff`]: retries a fallible async operation with
//!   exponentially growing delays.
//! - [`with_timeout`]: races a future against a timer.
//!
//! ```text
//!  caller ──► breaker.is_open()? ──yes──► skip
//!                  │ no
//!                  ▼
//!            queue.add(task) ──► task ──► on_success() / on_error()
//! ```

pub mod circuit_breaker;
pub mod error;
pub mod queue;
pub mod retry;
pub mod timeout;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error::ResilienceError;
pub use queue::{ConcurrencyQueue, QueueConfig};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use timeout::with_timeout;
