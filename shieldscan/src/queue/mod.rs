//! Bounded job queue with a fixed worker pool.
//!
//! Decouples request arrival from execution capacity. Submitters block
//! until a worker has run their job, and block *before* enqueueing when the
//! queue is full.
//!
//! ```text
//! ┌───────────┐  submit()   ┌──────────────────────┐   recv   ┌──────────┐
//! │ caller A  │───────────► │ mpsc (capacity = N)  │ ───────► │ worker 1 │──┐
//! ├───────────┤             │                      │          ├──────────┤  │ spawn job,
//! │ caller B  │───────────► │                      │ ───────► │ worker 2 │  │ reply via
//! └───────────┘             └──────────────────────┘          └──────────┘  │ oneshot
//!       ▲                                                                   │
//!       └──────────────────────── Result<T, QueueError> ◄──────────────────┘
//! ```
//!
//! Each job runs in its own task, so a panicking job is reported to its
//! submitter and never takes a worker down. A submitter that stops waiting
//! (for example on a request timeout) cancels its job.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors returned to submitters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("job queue is not running")]
    NotRunning,

    #[error("job queue stopped before the job completed")]
    Stopped,

    #[error("job was cancelled")]
    Cancelled,

    #[error("job panicked: {0}")]
    Panicked(String),
}

type BoxedJob<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
type JobFactory<T> = Box<dyn FnOnce(CancellationToken) -> BoxedJob<T> + Send + 'static>;

struct QueuedJob<T> {
    factory: JobFactory<T>,
    cancel: CancellationToken,
    reply: oneshot::Sender<Result<T, QueueError>>,
}

type SharedReceiver<T> = Arc<tokio::sync::Mutex<mpsc::Receiver<QueuedJob<T>>>>;

struct Running<T> {
    sender: mpsc::Sender<QueuedJob<T>>,
    receiver: SharedReceiver<T>,
    shutdown: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

/// A bounded queue executing jobs that produce `T`.
pub struct JobQueue<T: Send + 'static> {
    name: String,
    capacity: usize,
    worker_count: usize,
    running: Mutex<Option<Running<T>>>,
}

impl<T: Send + 'static> JobQueue<T> {
    /// Creates a stopped queue. Capacity and worker count are at least 1.
    pub fn new(name: impl Into<String>, capacity: usize, worker_count: usize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            worker_count: worker_count.max(1),
            running: Mutex::new(None),
        }
    }

    /// Launches the workers. No-op if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }

        let (sender, receiver) = mpsc::channel(self.capacity);
        let receiver: SharedReceiver<T> = Arc::new(tokio::sync::Mutex::new(receiver));
        let shutdown = CancellationToken::new();

        let workers = (0..self.worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    self.name.clone(),
                    worker_id,
                    Arc::clone(&receiver),
                    shutdown.clone(),
                ))
            })
            .collect();

        info!(
            queue = %self.name,
            workers = self.worker_count,
            capacity = self.capacity,
            "Job queue started"
        );
        *running = Some(Running {
            sender,
            receiver,
            shutdown,
            workers,
        });
    }

    /// Stops the workers and fails every job still queued. No-op if stopped.
    ///
    /// Jobs already running are cancelled and report [`QueueError::Stopped`].
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        let Running {
            sender,
            receiver,
            shutdown,
            workers,
        } = running;

        drop(sender);
        shutdown.cancel();
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(queue = %self.name, error = %e, "Queue worker ended abnormally");
            }
        }

        let mut receiver = receiver.lock().await;
        receiver.close();
        let mut drained = 0usize;
        while let Ok(job) = receiver.try_recv() {
            let _ = job.reply.send(Err(QueueError::Stopped));
            drained += 1;
        }
        info!(queue = %self.name, drained, "Job queue stopped");
    }

    /// Enqueues a job and waits for its result.
    ///
    /// `factory` is called on a worker with a token that is cancelled if the
    /// caller stops waiting or the queue stops.
    pub async fn submit<F, Fut>(&self, factory: F) -> Result<T, QueueError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let sender = self
            .running
            .lock()
            .as_ref()
            .map(|running| running.sender.clone())
            .ok_or(QueueError::NotRunning)?;

        let cancel = CancellationToken::new();
        let _cancel_on_abandon = cancel.clone().drop_guard();
        let (reply, response) = oneshot::channel();

        let job = QueuedJob {
            factory: Box::new(move |token| Box::pin(factory(token)) as BoxedJob<T>),
            cancel: cancel.clone(),
            reply,
        };
        sender.send(job).await.map_err(|_| QueueError::Stopped)?;
        drop(sender);

        response.await.map_err(|_| QueueError::Stopped)?
    }

    /// Number of jobs waiting for a worker.
    pub fn size(&self) -> usize {
        self.running
            .lock()
            .as_ref()
            .map(|running| running.sender.max_capacity() - running.sender.capacity())
            .unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

async fn worker_loop<T: Send + 'static>(
    queue: String,
    worker_id: usize,
    receiver: SharedReceiver<T>,
    shutdown: CancellationToken,
) {
    debug!(queue = %queue, worker_id, "Queue worker started");
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            job = async { receiver.lock().await.recv().await } => job,
        };
        let Some(job) = next else {
            break;
        };
        run_job(&queue, worker_id, job, &shutdown).await;
    }
    debug!(queue = %queue, worker_id, "Queue worker exited");
}

async fn run_job<T: Send + 'static>(
    queue: &str,
    worker_id: usize,
    job: QueuedJob<T>,
    shutdown: &CancellationToken,
) {
    let QueuedJob {
        factory,
        cancel,
        reply,
    } = job;

    if cancel.is_cancelled() {
        debug!(queue, worker_id, "Skipping job abandoned by its submitter");
        let _ = reply.send(Err(QueueError::Cancelled));
        return;
    }

    let handle = tokio::spawn(factory(cancel.clone()));
    let abort = handle.abort_handle();

    let result = tokio::select! {
        joined = handle => joined.map_err(|e| {
            if e.is_panic() {
                warn!(queue, worker_id, error = %e, "Job panicked");
                QueueError::Panicked(e.to_string())
            } else {
                QueueError::Cancelled
            }
        }),
        _ = cancel.cancelled() => {
            abort.abort();
            Err(QueueError::Cancelled)
        }
        _ = shutdown.cancelled() => {
            abort.abort();
            cancel.cancel();
            Err(QueueError::Stopped)
        }
    };

    let _ = reply.send(result);
}
