//! Error types for the signals crate

use thiserror::Error;

/// Reasons an incoming event is rejected before it is queued
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectError {
    #[error("Invalid event: must be an object")]
    NotAnObject,

    #[error("Invalid event: missing or invalid type")]
    InvalidType,

    #[error("Invalid event: missing or invalid timestamp")]
    InvalidTimestamp,

    #[error("Invalid event: missing or invalid data")]
    InvalidData,
}
