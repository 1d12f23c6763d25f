//! Pulse Clock Infrastructure
//!
//! Time sources for production and tests:
//!
//! - [`SystemClock`]: wall-clock time
//! - [`ManualClock`]: frozen time that only moves when advanced, for
//!   deterministic tests of time-dependent state (breaker reset windows,
//!   cache access timestamps)
//!
//! ## Usage
//!
//! ```ignore
//! use pulse_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(None);
//! let before = clock.now();
//! clock.advance(Duration::seconds(30));
//! assert_eq!(clock.now() - before, Duration::seconds(30));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use pulse_ports::Clock;
