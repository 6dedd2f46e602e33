//! Run-wide concurrency limiter.
//!
//! One [`ConcurrencyLimiter`] is created per scan run and shared by every
//! service and batch of that run. A check holds a [`LimiterPermit`] for its
//! whole execution, so the number of checks executing at once never
//! exceeds the limiter's capacity.
//!
//! The limiter is a simple capacity gate. It does not order waiters beyond
//! the FIFO fairness of the underlying semaphore.
//!
//! # Example
//!
//! ```
//! # tokio_test_block_on(async {
//! use shieldscan::executor::ConcurrencyLimiter;
//! use tokio_util::sync::CancellationToken;
//!
//! let limiter = ConcurrencyLimiter::new(2);
//! let cancel = CancellationToken::new();
//!
//! let permit = limiter.acquire(&cancel).await.unwrap();
//! assert_eq!(limiter.in_flight(), 1);
//! drop(permit);
//! assert_eq!(limiter.in_flight(), 0);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;

/// Errors from acquiring a limiter permit.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LimiterError {
    #[error("concurrency limiter closed")]
    Closed,

    #[error("permit acquisition cancelled")]
    Cancelled,
}

/// A semaphore-backed gate on concurrent check executions.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Semaphore,
    capacity: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ConcurrencyLimiter {
    /// Creates a limiter admitting at most `capacity` holders (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Waits for a permit, or returns early if `cancel` fires first.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LimiterPermit<'_>, LimiterError> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LimiterError::Cancelled),
            permit = self.semaphore.acquire() => permit.map_err(|_| LimiterError::Closed)?,
        };

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.update_peak(current);

        Ok(LimiterPermit {
            _permit: permit,
            in_flight: &self.in_flight,
        })
    }

    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    /// Rejects all current and future waiters.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Returns the current number of permit holders.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns the peak number of concurrent holders observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}

/// A permit from a [`ConcurrencyLimiter`], released on drop.
pub struct LimiterPermit<'a> {
    _permit: SemaphorePermit<'a>,
    in_flight: &'a AtomicUsize,
}

impl Drop for LimiterPermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for LimiterPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimiterPermit").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let limiter = ConcurrencyLimiter::new(2);
        let cancel = CancellationToken::new();

        let a = limiter.acquire(&cancel).await.unwrap();
        let b = limiter.acquire(&cancel).await.unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert_eq!(limiter.available(), 0);

        drop(a);
        assert_eq!(limiter.in_flight(), 1);
        assert_eq!(limiter.available(), 1);
        drop(b);
        assert_eq!(limiter.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_becomes_one() {
        let limiter = ConcurrencyLimiter::new(0);
        assert_eq!(limiter.capacity(), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let limiter = ConcurrencyLimiter::new(1);
        let cancel = CancellationToken::new();
        let _held = limiter.acquire(&cancel).await.unwrap();

        let waiter_cancel = CancellationToken::new();
        waiter_cancel.cancel();
        let result = limiter.acquire(&waiter_cancel).await;
        assert_eq!(result.unwrap_err(), LimiterError::Cancelled);
        assert_eq!(limiter.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_closed_limiter_rejects() {
        let limiter = ConcurrencyLimiter::new(1);
        limiter.close();
        let result = limiter.acquire(&CancellationToken::new()).await;
        assert_eq!(result.unwrap_err(), LimiterError::Closed);
    }

    #[tokio::test]
    async fn test_holders_never_exceed_capacity() {
        let limiter = Arc::new(ConcurrencyLimiter::new(3));
        let cancel = CancellationToken::new();

        let tasks: Vec<_> = (0..12)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let _permit = limiter.acquire(&cancel).await.unwrap();
                    assert!(limiter.in_flight() <= 3);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(limiter.in_flight(), 0);
        assert!(limiter.peak_in_flight() <= 3);
        assert!(limiter.peak_in_flight() >= 1);
    }
}
