//! Pulse Runtime
//!
//! Assembles the signal pipeline from a single [`PulseConfig`]:
//!
//! ```text
//!                 ┌──────────────────────────── Pipeline ─────────────────────────────┐
//!  raw events ──► │ EventCollector ──► SignalCoordinator ──► time_based / search       │
//!                 │       │                                                            │
//!                 │       └── search ──► SearchAccessObserver ──► AdaptiveCacheStrategy│
//!                 │                                                   │                │
//!                 │                         CacheService ◄────────────┘                │
//!                 │                  (ConcurrencyQueue + CircuitBreaker ──► search)    │
//!                 └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is global: every component receives its configuration and
//! collaborators explicitly.

pub mod config;
pub mod logging;
pub mod observers;
pub mod pipeline;

pub use config::{ConfigError, LoggingConfig, ProcessorsConfig, PulseConfig, RoutingConfig};
pub use logging::init_logging;
pub use observers::SearchAccessObserver;
pub use pipeline::Pipeline;
