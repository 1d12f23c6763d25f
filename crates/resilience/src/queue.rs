//! Concurrency-limited task queue
//!
//! Bounds the number of simultaneously running async tasks. Tasks beyond the
//! limit wait for a slot and are started in arrival order as slots free up.
//!
//! Completion order is not submission order: a short task submitted while
//! the queue is saturated only starts once an active task finishes, so it
//! can complete after longer tasks that were submitted before it.

use crate::error::ResilienceError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, TryAcquireError};

/// Queue configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of tasks running at once
    pub concurrent_limit: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrent_limit: 5,
        }
    }
}

/// Decrements the waiting counter when a queued task stops waiting,
/// including when its future is dropped before it gets a slot.
struct Waiting<'a>(&'a AtomicUsize);

impl<'a> Waiting<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Concurrency-limited queue of async tasks
///
/// Slots are handed out by a fair semaphore, so waiting tasks start in the
/// order they were added. A task's output (including an `Err`) is returned
/// only to the caller that added it; the slot is released either way.
pub struct ConcurrencyQueue {
    concurrent_limit: usize,
    slots: Semaphore,
    waiting: AtomicUsize,
}

impl ConcurrencyQueue {
    pub fn new(config: QueueConfig) -> Self {
        let concurrent_limit = config.concurrent_limit.max(1);
        Self {
            concurrent_limit,
            slots: Semaphore::new(concurrent_limit),
            waiting: AtomicUsize::new(0),
        }
    }

    pub fn with_limit(concurrent_limit: usize) -> Self {
        Self::new(QueueConfig { concurrent_limit })
    }

    /// Run `task` once a slot is available and return its output
    ///
    /// Runs immediately when fewer than `concurrent_limit` tasks are active;
    /// otherwise waits behind previously queued tasks. Fails only if the
    /// queue has been closed.
    pub async fn add<F, Fut, T>(&self, task: F) -> Result<T, ResilienceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _slot = match self.slots.try_acquire() {
            Ok(slot) => slot,
            Err(TryAcquireError::Closed) => return Err(ResilienceError::QueueClosed),
            Err(TryAcquireError::NoPermits) => {
                let _waiting = Waiting::enter(&self.waiting);
                debug!(
                    "[QUEUE] saturated ({} active), task queued behind {} others",
                    self.concurrent_limit,
                    self.waiting.load(Ordering::SeqCst) - 1
                );
                self.slots
                    .acquire()
                    .await
                    .map_err(|_| ResilienceError::QueueClosed)?
            }
        };

        Ok(task().await)
    }

    /// Stop accepting tasks
    ///
    /// Running tasks finish normally; queued and future `add` calls fail
    /// with [`ResilienceError::QueueClosed`].
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }

    /// Number of tasks currently running
    pub fn active_requests(&self) -> usize {
        self.concurrent_limit
            .saturating_sub(self.slots.available_permits())
    }

    /// Number of tasks waiting for a slot
    pub fn queued(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn concurrent_limit(&self) -> usize {
        self.concurrent_limit
    }
}

impl Default for ConcurrencyQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}
