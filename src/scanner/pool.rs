//! Fixed-size worker pool over a bounded task queue.

use super::traits::{Executor, Task};
use crate::error::{ScanError, ScanResult};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Cloneable submission side of the pool.
#[derive(Debug, Clone)]
pub struct PoolHandle {
    tx: mpsc::Sender<Task>,
}

impl PoolHandle {
    /// Enqueue a task, waiting while the queue is full.
    pub async fn submit(&self, task: Task) -> ScanResult<()> {
        self.tx.send(task).await.map_err(|_| ScanError::PoolClosed)
    }
}

/// N long-lived workers draining one FIFO queue. Each task is taken by
/// exactly one worker and executed there to completion.
pub struct WorkerPool {
    handle: PoolHandle,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers behind a queue of `capacity` tasks.
    pub fn start<E: Executor>(size: usize, capacity: usize, executor: Arc<E>) -> Self {
        let (tx, rx) = mpsc::channel::<Task>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..size.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let executor = Arc::clone(&executor);
                tokio::spawn(async move {
                    loop {
                        let next = rx.lock().await.recv().await;
                        let Some(task) = next else { break };
                        executor.execute(task.descriptor.clone()).await;
                    }
                    debug!(worker = id, "worker stopped");
                })
            })
            .collect();

        Self {
            handle: PoolHandle { tx },
            workers,
        }
    }

    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and wait for the workers to drain it. Returns once
    /// every outstanding [`PoolHandle`] has been dropped and the queue is empty.
    pub async fn join(self) {
        drop(self.handle);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "worker task failed");
            }
        }
    }
}
