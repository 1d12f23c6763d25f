//! Pulse Ports
//!
//! Port definitions (traits) for the Pulse signal processing system.
//! These define the boundaries between domain logic and infrastructure:
//! observers and processors on the inside, the cache store and the
//! search backend on the outside.

mod clock;
mod error;
mod observer;
mod processor;
mod search;
mod store;

pub use clock::Clock;
pub use error::{
    ObserverError, ProcessingError, ProcessingResult, SearchError, StoreError, StoreResult,
};
pub use observer::Notifiable;
pub use processor::SignalProcessor;
pub use search::{SearchClient, SearchHit, SearchRequest, SearchResults};
pub use store::CacheStore;
