//! Pulse Signals
//!
//! In-process ingestion and processing of signals:
//!
//! ```text
//!  producers ──collect()──► EventCollector ──validate──► FIFO queue
//!                                                           │ drain (one event at a time)
//!                                                           ▼
//!                                   observers registered for the event's type
//!                                   (notified concurrently, awaited together)
//!                                                           │
//!                                                           ▼
//!                                                   SignalCoordinator
//!                                        SignalRouter::match_signal(criteria)
//!                                         │                │              │
//!                                         ▼                ▼              ▼
//!                                  TimeBasedProcessor  SearchSignalProcessor  ...
//! ```
//!
//! A failing observer or processor is logged and skipped; it never prevents
//! its siblings from running.

pub mod collector;
pub mod coordinator;
pub mod error;
pub mod processors;
pub mod router;

pub use collector::{CollectorStats, EventCollector};
pub use coordinator::{CoordinatorConfig, CoordinatorStats, SignalCoordinator};
pub use error::CollectError;
pub use processors::{
    SearchProcessorConfig, SearchSignalProcessor, TimeBasedProcessor, TimeProcessorConfig,
};
pub use router::{ProcessorCriteria, SignalRouter};
