//! Upload service
//!
//! Stores a packaged archive in object storage under a given key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bitbackup_client::S3Client;
use std::path::Path;

/// Destination for finished archives
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Uploads the file at `archive` as object `key`
    async fn upload(&self, key: &str, archive: &Path) -> Result<()>;
}

/// S3 implementation of Uploader
///
/// Streams the archive from disk. Holds its own HTTP client, so each worker
/// builds a separate instance.
pub struct S3Uploader {
    client: S3Client,
}

impl S3Uploader {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Uploader for S3Uploader {
    async fn upload(&self, key: &str, archive: &Path) -> Result<()> {
        let file = tokio::fs::File::open(archive)
            .await
            .with_context(|| format!("Failed to read archive {}", archive.display()))?;

        self.client
            .put_object(key, file)
            .await
            .with_context(|| format!("Failed to upload s3://{}/{}", self.client.bucket(), key))
    }
}
