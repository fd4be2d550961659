//! Worker pool
//!
//! A fixed set of workers consuming a shared FIFO of backup jobs.
//!
//! The queue holds at most one job per worker, so [`WorkerPool::submit`]
//! blocks once every worker is busy and every slot is taken. This caps how
//! many clones and archives can exist on disk at the same time.

use anyhow::{Context, Result, bail};
use async_channel::{Receiver, SendError, Sender};
use bitbackup_core::domain::job::JobOutcome;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::scheduler::job::BackupJob;
use crate::scheduler::toolbox::ResourceToolbox;

/// Lifecycle of a pool; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PoolPhase {
    /// Accepting jobs
    Running,
    /// No longer accepting jobs; workers finish what is queued
    Draining,
    /// Every worker has exited
    Stopped,
}

/// Success and failure counts shared by all workers
#[derive(Debug, Default)]
pub struct PoolTally {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl PoolTally {
    fn record(&self, outcome: &JobOutcome) {
        let counter = if outcome.is_success() {
            &self.succeeded
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Fixed-size pool of backup workers
pub struct WorkerPool {
    size: usize,
    sender: Sender<BackupJob>,
    phase: Mutex<PoolPhase>,
    workers: Vec<JoinHandle<()>>,
    tally: Arc<PoolTally>,
}

impl WorkerPool {
    /// Starts `size` workers, each with its own toolbox
    ///
    /// `toolbox_factory` is called exactly once per worker. All toolboxes
    /// are built before any worker starts, so a factory failure leaves no
    /// workers running. Must be called from within a Tokio runtime.
    pub fn new<F>(size: usize, toolbox_factory: F) -> Result<Self>
    where
        F: Fn() -> Result<ResourceToolbox>,
    {
        if size < 1 {
            bail!("worker pool needs at least 1 worker, got {}", size);
        }

        let toolboxes = (1..=size)
            .map(|id| {
                toolbox_factory().with_context(|| format!("Failed to build toolbox for worker {}", id))
            })
            .collect::<Result<Vec<_>>>()?;

        let (sender, receiver) = async_channel::bounded(size);
        let tally = Arc::new(PoolTally::default());

        let workers = toolboxes
            .into_iter()
            .enumerate()
            .map(|(index, toolbox)| {
                let worker = Worker {
                    toolbox: Arc::new(toolbox),
                    queue: receiver.clone(),
                    tally: Arc::clone(&tally),
                };
                tokio::spawn(worker.run().instrument(info_span!("worker", id = index + 1)))
            })
            .collect();

        info!("Started {} workers", size);

        Ok(Self {
            size,
            sender,
            phase: Mutex::new(PoolPhase::Running),
            workers,
            tally,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn phase(&self) -> PoolPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tally(&self) -> &PoolTally {
        &self.tally
    }

    /// Queues a job, waiting while the queue is full
    ///
    /// Returns `false` without queueing when the pool is draining or
    /// stopped, including when shutdown begins while this call is waiting.
    pub async fn submit(&self, job: BackupJob) -> bool {
        let phase = self.phase();
        if phase != PoolPhase::Running {
            debug!("Pool is {:?}, dropping job for {}", phase, job.identifier());
            return false;
        }

        match self.sender.send(job).await {
            Ok(()) => true,
            Err(SendError(job)) => {
                debug!("Queue closed, dropping job for {}", job.identifier());
                false
            }
        }
    }

    /// Stops accepting jobs; workers exit once the queue is empty
    pub fn shutdown(&self) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase == PoolPhase::Running {
            *phase = PoolPhase::Draining;
            self.sender.close();
            info!("Worker pool draining, {} job(s) still queued", self.sender.len());
        }
    }

    /// Waits for every worker to exit
    ///
    /// Only returns after [`shutdown`](Self::shutdown) has been called and
    /// the queue has drained. Calling it again is a no-op.
    pub async fn wait(&mut self) {
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                warn!("Worker task panicked: {}", e);
            }
        }

        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != PoolPhase::Stopped {
            *phase = PoolPhase::Stopped;
            debug!("Worker pool stopped");
        }
    }
}

/// A consume loop bound to one toolbox
struct Worker {
    toolbox: Arc<ResourceToolbox>,
    queue: Receiver<BackupJob>,
    tally: Arc<PoolTally>,
}

impl Worker {
    /// Executes jobs one at a time until the queue is closed and empty
    ///
    /// Each job runs in its own task so a panic fails that job only; the
    /// worker keeps consuming.
    async fn run(self) {
        debug!("Worker ready");

        while let Ok(job) = self.queue.recv().await {
            let outcome = self.execute(job).await;
            debug!("Finished {}", outcome.repository());
            self.tally.record(&outcome);
        }

        debug!("Queue drained, worker exiting");
    }

    async fn execute(&self, job: BackupJob) -> JobOutcome {
        let repository = job.identifier().to_string();
        let toolbox = Arc::clone(&self.toolbox);

        let task = tokio::spawn(async move { job.execute(&toolbox).await }.in_current_span());
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to back up {}: {}", repository, e);
                JobOutcome::Failed {
                    repository,
                    reason: e.to_string(),
                }
            }
        }
    }
}
