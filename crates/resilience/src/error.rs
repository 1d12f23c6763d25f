//! Error types for the resilience crate

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError {
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Queue is closed")]
    QueueClosed,

    #[error("Circuit open: {0}")]
    CircuitOpen(String),
}
