//! Bounded pool of blocking workers.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{Result, SynthError};

/// Runs blocking work on at most `size` threads at a time.
///
/// Callers wait asynchronously for a slot; the work itself runs on tokio's
/// blocking thread pool and holds the slot until it returns.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of free slots.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SynthError::Worker("worker pool closed".to_string()))
    }

    /// Waits for a slot and starts `f` in it.
    pub async fn spawn<F, T>(&self, f: F) -> Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.acquire().await?;
        Ok(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        }))
    }

    /// Waits for a slot, runs `f` in it and returns its result.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.spawn(f)
            .await?
            .await
            .map_err(|e| SynthError::Worker(e.to_string()))
    }
}
