use crate::error::ObserverError;
use async_trait::async_trait;
use pulse_core::Signal;

/// Capability implemented by every listener registered on the collector
///
/// Notifications for a single event are delivered to all of its observers
/// concurrently. A returned error is logged by the collector and does not
/// affect other observers or later events.
#[async_trait]
pub trait Notifiable: Send + Sync {
    /// Handle one collected signal
    async fn on_event(&self, signal: &Signal) -> Result<(), ObserverError>;

    /// Observer name for logging
    fn name(&self) -> &str {
        "observer"
    }
}
