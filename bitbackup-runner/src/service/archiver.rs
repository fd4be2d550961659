//! Archive service
//!
//! Clones a repository and packages it as a `.tar.gz`. All intermediate
//! files are temporary: the clone directory is removed before `archive`
//! returns, and the archive file is removed when its handle is dropped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bitbackup_core::domain::repository::CloneEndpoint;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A packaged archive on local disk
///
/// Owns whatever keeps the file alive; dropping the handle releases it.
pub struct ArchiveHandle {
    path: PathBuf,
    _resource: Box<dyn Send + Sync>,
}

impl ArchiveHandle {
    /// Wraps `path`, releasing it by dropping `resource`
    pub fn new(path: PathBuf, resource: impl Send + Sync + 'static) -> Self {
        Self {
            path,
            _resource: Box::new(resource),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Produces a complete archive of a repository, or fails
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, endpoint: &CloneEndpoint) -> Result<ArchiveHandle>;
}

/// Archiver backed by `git clone --bare`
pub struct GitArchiver {
    git_binary: PathBuf,
    scratch_dir: PathBuf,
}

impl GitArchiver {
    /// Uses `git` from `PATH` and the system temporary directory
    pub fn new() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Places clones and archives under `scratch_dir`
    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    #[cfg(test)]
    fn with_git_binary(mut self, git_binary: impl Into<PathBuf>) -> Self {
        self.git_binary = git_binary.into();
        self
    }
}

impl Default for GitArchiver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Archiver for GitArchiver {
    async fn archive(&self, endpoint: &CloneEndpoint) -> Result<ArchiveHandle> {
        let basename = endpoint.basename().to_string();

        let clone_dir = tempfile::Builder::new()
            .prefix("bitbackup-")
            .suffix(".git")
            .tempdir_in(&self.scratch_dir)
            .context("Failed to create clone directory")?;

        debug!("Cloning {} into {}...", endpoint, clone_dir.path().display());

        let mut command = Command::new(&self.git_binary);
        command
            .args(["clone", "--bare", "--quiet"])
            .arg(endpoint.expose())
            .arg(clone_dir.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());

        // Own process group: a Ctrl-C in the terminal must not kill a clone
        // that has already started
        #[cfg(unix)]
        command.process_group(0);

        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.git_binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git clone exited with {}: {}", output.status, stderr.trim());
        }

        let source = clone_dir.path().to_path_buf();
        let scratch_dir = self.scratch_dir.clone();
        tokio::task::spawn_blocking(move || pack(&source, &basename, &scratch_dir))
            .await
            .context("Archive task panicked")?
    }
}

/// Tar and gzip `source` into a temporary file under `scratch_dir`
///
/// The archive holds a single top-level directory named `basename`.
fn pack(source: &Path, basename: &str, scratch_dir: &Path) -> Result<ArchiveHandle> {
    let output = tempfile::Builder::new()
        .prefix("bitbackup-")
        .suffix(".tar.gz")
        .tempfile_in(scratch_dir)
        .context("Failed to create archive file")?;

    debug!(
        "Tar and GZ {} to {} as {}...",
        source.display(),
        output.path().display(),
        basename
    );

    let encoder = GzEncoder::new(output.as_file(), Compression::default());
    let mut tar = tar::Builder::new(encoder);
    tar.follow_symlinks(false);
    tar.append_dir_all(basename, source)
        .with_context(|| format!("Failed to add {} to archive", source.display()))?;
    tar.into_inner()
        .and_then(|encoder| encoder.finish())
        .context("Failed to finish archive")?;

    let path = output.into_temp_path();
    Ok(ArchiveHandle::new(path.to_path_buf(), path))
}
