//! Pulse Cache
//!
//! Adaptive caching of search results. Every observed query access feeds a
//! per-query [`QueryPattern`]; the [`AdaptiveCacheStrategy`] turns that
//! pattern into a TTL, a warming priority and a revalidation flag.
//!
//! ```text
//!  search signals ──► update_query_pattern ──► QueryPattern (per key)
//!                                                   │
//!                     determine_optimal_cache_strategy
//!                                                   │
//!  cache_search_results ──► CacheStore (ttl)        ▼
//!  warm_cache ──► hot, uncached queries ──► ConcurrencyQueue ──► SearchClient
//!                                 (skipped while the CircuitBreaker is open)
//! ```
//!
//! Store failures are retried with backoff and then degrade to a miss or a
//! skipped write; the service never surfaces them to callers.

pub mod adapters;
pub mod service;
pub mod strategy;

pub use adapters::InMemoryStore;
pub use service::{
    CacheService, CacheServiceBuilder, CacheStats, CachedSearchResults, WarmReport, WarmScope,
};
pub use strategy::{AdaptiveCacheStrategy, CacheConfig, CacheStrategy, QueryPattern, TrackedQuery, cache_key};
