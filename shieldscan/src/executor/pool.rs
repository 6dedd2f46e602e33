//! Bounded blocking pool.
//!
//! Checks are synchronous and may block on I/O, so they run on tokio's
//! blocking threads. A [`BlockingPool`] caps how many of those closures may
//! execute at once, and can be shut down so that nothing new starts once its
//! owner is done.
//!
//! ```text
//!   run pool "aws:run-7" (size = max_workers) ─── shared slots
//!     ├── scoped "aws:s3"   shut down when s3 finishes
//!     └── scoped "aws:ec2"  shut down when ec2 finishes
//! ```
//!
//! A slot is held by the closure, not by its caller. A closure that ignores
//! cancellation keeps its slot until it returns, so abandoned work still
//! counts against the cap of every pool sharing those slots. Shutdown does
//! not wait for such closures.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Errors from running work on a [`BlockingPool`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was shut down before the work could start.
    #[error("blocking pool is shut down")]
    Shutdown,

    /// The closure panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// A capacity-limited front for `tokio::task::spawn_blocking`.
#[derive(Debug)]
pub struct BlockingPool {
    name: String,
    permits: Arc<Semaphore>,
    size: usize,
    closed: CancellationToken,
}

impl BlockingPool {
    /// Creates a pool running at most `size` closures at once (minimum 1).
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name: name.into(),
            permits: Arc::new(Semaphore::new(size)),
            size,
            closed: CancellationToken::new(),
        }
    }

    /// Creates a pool drawing on this pool's slots.
    ///
    /// The scoped pool can be shut down on its own; shutting down `self`
    /// shuts it down too.
    pub fn scoped(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permits: Arc::clone(&self.permits),
            size: self.size,
            closed: self.closed.child_token(),
        }
    }

    /// Waits for a free slot.
    ///
    /// Callers that time-box their work should start the clock after this
    /// returns, so queueing behind busy slots is not charged to the work.
    pub async fn acquire(&self) -> Result<PoolSlot, PoolError> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(PoolError::Shutdown),
            permit = Arc::clone(&self.permits).acquire_owned() => permit
                .map(|permit| PoolSlot { permit })
                .map_err(|_| PoolError::Shutdown),
        }
    }

    /// Runs `f` on a blocking thread once a slot is free.
    ///
    /// The slot is held until `f` returns, even if the caller stops waiting.
    pub async fn run<F, R>(&self, f: F) -> Result<R, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.acquire().await?.run(f).await
    }

    /// Stops admitting new work. Idempotent.
    pub fn shutdown(&self) {
        if !self.closed.is_cancelled() {
            tracing::debug!(
                pool = %self.name,
                busy = self.busy(),
                "Blocking pool shut down"
            );
            self.closed.cancel();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.closed.is_cancelled()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Closures currently running.
    pub fn busy(&self) -> usize {
        self.size - self.permits.available_permits()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An admitted slot of a [`BlockingPool`].
#[derive(Debug)]
pub struct PoolSlot {
    permit: OwnedSemaphorePermit,
}

impl PoolSlot {
    /// Runs `f` on a blocking thread, moving the slot onto that thread.
    pub async fn run<F, R>(self, f: F) -> Result<R, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = self.permit;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await
        .map_err(|e| PoolError::Panicked(e.to_string()))
    }
}

impl Drop for BlockingPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_value() {
        let pool = BlockingPool::new("test", 2);
        let value = pool.run(|| 21 * 2).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.busy(), 0);
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let pool = BlockingPool::new("test", 1);
        let result: Result<(), _> = pool.run(|| panic!("boom")).await;
        assert!(matches!(result, Err(PoolError::Panicked(_))));

        // Slot is released after the panic.
        assert_eq!(pool.run(|| 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_work() {
        let pool = BlockingPool::new("test", 1);
        pool.shutdown();
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert_eq!(pool.run(|| ()).await, Err(PoolError::Shutdown));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_is_bounded() {
        let pool = Arc::new(BlockingPool::new("test", 2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    pool.run(move || {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(20));
                        running.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_scoped_pools_share_slots() {
        let run = BlockingPool::new("run", 1);
        let first = run.scoped("first");
        let second = run.scoped("second");

        let held = first.acquire().await.unwrap();
        assert_eq!(second.busy(), 1);
        let waiting = tokio::time::timeout(Duration::from_millis(30), second.acquire()).await;
        assert!(waiting.is_err());

        first.shutdown();
        assert_eq!(first.run(|| ()).await, Err(PoolError::Shutdown));
        drop(held);
        assert_eq!(second.run(|| 5).await.unwrap(), 5);

        run.shutdown();
        assert!(second.is_shutdown());
        assert_eq!(second.run(|| ()).await, Err(PoolError::Shutdown));
    }

    #[tokio::test]
    async fn test_abandoned_work_keeps_its_slot() {
        let pool = BlockingPool::new("test", 1);

        let stuck = tokio::time::timeout(
            Duration::from_millis(20),
            pool.run(|| std::thread::sleep(Duration::from_millis(200))),
        )
        .await;
        assert!(stuck.is_err());
        assert_eq!(pool.busy(), 1);

        // Admission waits for the abandoned closure to return.
        let admitted = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(admitted.is_err());

        let slot = tokio::time::timeout(Duration::from_secs(2), pool.acquire())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(slot.run(|| 7).await.unwrap(), 7);
        assert_eq!(pool.busy(), 0);
    }
}
