//! Owned worker pool for icon fetches, debounce timers and catalog requests.
//!
//! The binary builds exactly one `WorkerPool` at startup and calls
//! [`WorkerPool::shutdown`] on exit. Components never own the pool itself; they
//! receive a cloneable [`PoolHandle`] at construction time.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::{oneshot, Semaphore};

pub const DEFAULT_WORKERS: usize = 6;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

pub struct WorkerPool {
    runtime: Runtime,
    handle: PoolHandle,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, String> {
        let workers = workers.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("flathub-search-worker")
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to start worker pool: {}", e))?;

        let handle = PoolHandle {
            runtime: runtime.handle().clone(),
            permits: Arc::new(Semaphore::new(workers)),
        };
        log::debug!("Worker pool started with {} workers", workers);
        Ok(Self { runtime, handle })
    }

    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    /// Drive a future to completion from a thread outside the pool.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Stop accepting work. Jobs still running get a short grace period; their
    /// results are dropped.
    pub fn shutdown(self) {
        self.runtime.shutdown_timeout(SHUTDOWN_GRACE);
        log::debug!("Worker pool stopped");
    }
}

/// Submit side of the pool. Blocking jobs are limited to as many concurrent
/// runs as the pool has workers.
#[derive(Clone)]
pub struct PoolHandle {
    runtime: Handle,
    permits: Arc<Semaphore>,
}

impl PoolHandle {
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Queue a blocking job and return immediately.
    pub fn submit<T, F>(&self, job: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let permits = Arc::clone(&self.permits);
        self.runtime.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            match tokio::task::spawn_blocking(job).await {
                Ok(value) => {
                    // Receiver gone means the caller stopped waiting; nothing to report.
                    let _ = tx.send(value);
                }
                Err(e) => log::warn!("Pool job failed: {}", e),
            }
        });
        TaskHandle { rx }
    }
}

/// Result slot of a submitted job.
///
/// Dropping the handle abandons the result: the job keeps running and whatever
/// it returns is discarded.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Wait at most `deadline` for the job. `None` if it is still running or failed.
    pub async fn try_get(&mut self, deadline: Duration) -> Option<T> {
        match tokio::time::timeout(deadline, &mut self.rx).await {
            Ok(Ok(value)) => Some(value),
            _ => None,
        }
    }
}
