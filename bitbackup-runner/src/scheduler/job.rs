//! Backup job
//!
//! One job per repository. Executing a job clones, packages and uploads the
//! repository using the executing worker's toolbox, and always yields a
//! [`JobOutcome`]: errors stop at this boundary.

use anyhow::{Context, Result};
use bitbackup_core::domain::job::JobOutcome;
use bitbackup_core::domain::repository::RepositoryDescriptor;
use tracing::{debug, error, info};

use crate::scheduler::toolbox::ResourceToolbox;

/// Unit of work scheduled by the worker pool
#[derive(Debug)]
pub struct BackupJob {
    repository: RepositoryDescriptor,
}

impl BackupJob {
    pub fn new(repository: RepositoryDescriptor) -> Self {
        Self { repository }
    }

    pub fn identifier(&self) -> &str {
        self.repository.identifier()
    }

    /// Back up the repository, consuming the job
    ///
    /// Failures are logged with the repository name and returned as
    /// [`JobOutcome::Failed`]; they never reach the worker loop.
    pub async fn execute(self, toolbox: &ResourceToolbox) -> JobOutcome {
        let repository = self.identifier().to_string();

        match self.back_up(toolbox).await {
            Ok(key) => {
                info!("Backed up {}!", repository);
                JobOutcome::Succeeded { repository, key }
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                error!("Failed to back up {}: {}", repository, reason);
                JobOutcome::Failed { repository, reason }
            }
        }
    }

    async fn back_up(&self, toolbox: &ResourceToolbox) -> Result<String> {
        let endpoint = toolbox
            .provider
            .clone_endpoint(&self.repository)
            .context("Failed to resolve clone URL")?;

        // Dropping the handle deletes the archive, on success and failure alike
        let archive = toolbox
            .archiver
            .archive(&endpoint)
            .await
            .context("Failed to archive repository")?;

        let key = toolbox.object_key(&self.repository);
        debug!("Uploading {} as {}...", archive.path().display(), key);

        toolbox
            .uploader
            .upload(&key, archive.path())
            .await
            .context("Failed to upload archive")?;

        Ok(key)
    }
}
