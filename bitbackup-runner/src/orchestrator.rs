//! Backup run driver
//!
//! Lists repositories, feeds one job per repository into a worker pool and
//! waits for the pool to drain. A run moves through
//! `Listing -> Submitting -> Draining -> Stopped` exactly once.

use anyhow::{Context, Result};
use bitbackup_core::domain::job::RunSummary;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::scheduler::{BackupJob, ResourceToolbox, WorkerPool};
use crate::service::RepositoryProvider;
use crate::signal::CancellationSignal;

pub struct Orchestrator {
    provider: Arc<dyn RepositoryProvider>,
    cancellation: CancellationSignal,
    worker_count: usize,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn RepositoryProvider>,
        cancellation: CancellationSignal,
        worker_count: usize,
    ) -> Self {
        Self {
            provider,
            cancellation,
            worker_count,
        }
    }

    /// Backs up every listed repository
    ///
    /// Listing and pool start-up failures abort the run. Per-repository
    /// failures only show up in the returned summary.
    pub async fn run<F>(&self, toolbox_factory: F) -> Result<RunSummary>
    where
        F: Fn() -> Result<ResourceToolbox>,
    {
        let started_at = Utc::now();

        info!("Loading repository list...");
        let repositories = self
            .provider
            .list_repositories()
            .await
            .context("Failed to load repository list")?;
        let listed = repositories.len();
        info!("Found {} repositories", listed);

        info!("Starting {} workers...", self.worker_count);
        let mut pool = WorkerPool::new(self.worker_count, toolbox_factory)
            .context("Failed to start worker pool")?;

        let mut submitted = 0;
        let mut cancelled = false;

        for repository in repositories {
            if self.cancellation.should_stop() {
                warn!(
                    "Interrupted, skipping {} remaining repositories",
                    listed - submitted
                );
                cancelled = true;
                break;
            }

            // Blocks while every worker is busy and the queue is full
            if pool.submit(BackupJob::new(repository)).await {
                submitted += 1;
            }
        }

        info!(
            "Submitted {} of {} repositories to {} workers, draining",
            submitted,
            listed,
            pool.size()
        );
        pool.shutdown();
        pool.wait().await;

        let tally = pool.tally();
        Ok(RunSummary {
            listed,
            submitted,
            succeeded: tally.succeeded(),
            failed: tally.failed(),
            cancelled,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
