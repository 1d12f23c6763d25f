use thiserror::Error;

/// Errors raised by a processor while handling a signal or batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Signal {signal_id} is missing required metadata: {field}")]
    MissingMetadata { signal_id: String, field: String },

    #[error("Processor {processor_id} failed: {reason}")]
    Failed { processor_id: String, reason: String },
}

pub type ProcessingResult<T> = std::result::Result<T, ProcessingError>;

/// Errors raised by an observer while handling a notification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error("Observer {observer} failed: {reason}")]
    Failed { observer: String, reason: String },
}

/// Cache store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Search backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search backend unavailable: {0}")]
    Unavailable(String),

    #[error("Search request failed: {0}")]
    Request(String),
}
