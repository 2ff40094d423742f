use std::future::Future;

use tokio::sync::Semaphore;

use crate::error::{ArchiveError, Result};

/// Default number of snapshot fetches allowed in flight at once.
pub const DEFAULT_CAPACITY: usize = 5;

/// Bounds how many tasks run at once. Excess callers wait in arrival order:
/// tokio's semaphore hands out permits FIFO, and a permit is returned when it
/// drops, so a task that fails or is cancelled still frees its slot.
pub struct AdmissionLimiter {
    semaphore: Semaphore,
    capacity: usize,
}

impl AdmissionLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held by a running task.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot, then build and run the task while holding it.
    pub async fn run<F, Fut, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ArchiveError::LimiterClosed)?;

        Ok(task().await)
    }
}

impl Default for AdmissionLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
