//! Bound on concurrent task-generation units.
//!
//! Independent of the worker pool: the pool bounds running probes, the
//! limiter bounds how many hosts (or domain templates) are being expanded
//! into tasks at once.

use crate::error::{ScanError, ScanResult};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct GenerationLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl GenerationLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> ScanResult<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ScanError::PoolClosed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
