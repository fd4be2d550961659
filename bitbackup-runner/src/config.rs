//! Runner configuration
//!
//! Credentials and destinations for a backup run plus the worker count.
//! Values come from the command line (or the matching environment
//! variables) and are validated before anything starts.

use bitbackup_client::DEFAULT_BITBUCKET_ENDPOINT;
use bitbackup_client::s3::{DEFAULT_S3_ENDPOINT, DEFAULT_S3_REGION};
use std::fmt;
use std::path::PathBuf;

/// Default number of concurrent workers
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// Runner configuration
#[derive(Clone)]
pub struct Config {
    /// Bitbucket user or team whose repositories are backed up
    pub bitbucket_username: String,

    /// Bitbucket password or app password
    pub bitbucket_password: String,

    /// Bitbucket API root (e.g., "https://api.bitbucket.org/2.0/")
    pub bitbucket_endpoint: String,

    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_bucket: String,

    /// Key prefix under which archives are stored
    pub s3_base_path: String,

    /// S3-compatible endpoint (e.g., "https://s3.amazonaws.com")
    pub s3_endpoint: String,

    /// Region used for request signing
    pub s3_region: String,

    /// Number of repositories backed up in parallel
    pub worker_count: usize,

    /// Where clones and archives are staged; the system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration with defaults
    ///
    /// The base path defaults to the current local time as `%Y-%m-%d-%H:%M`,
    /// so each run lands in its own folder.
    pub fn new(
        bitbucket_username: String,
        bitbucket_password: String,
        s3_access_key: String,
        s3_secret_key: String,
        s3_bucket: String,
    ) -> Self {
        Self {
            bitbucket_username,
            bitbucket_password,
            bitbucket_endpoint: DEFAULT_BITBUCKET_ENDPOINT.to_string(),
            s3_access_key,
            s3_secret_key,
            s3_bucket,
            s3_base_path: default_base_path(),
            s3_endpoint: DEFAULT_S3_ENDPOINT.to_string(),
            s3_region: DEFAULT_S3_REGION.to_string(),
            worker_count: DEFAULT_WORKER_COUNT,
            scratch_dir: None,
        }
    }

    /// Base path without leading or trailing slashes
    pub fn key_prefix(&self) -> &str {
        self.s3_base_path.trim_matches('/')
    }

    /// Human-readable destination, e.g. `s3://bucket/2024-01-01-12:30`
    pub fn destination(&self) -> String {
        format!("s3://{}/{}", self.s3_bucket, self.key_prefix())
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bitbucket_username.is_empty() {
            anyhow::bail!("bitbucket username cannot be empty");
        }

        if self.bitbucket_password.is_empty() {
            anyhow::bail!("bitbucket password cannot be empty");
        }

        if self.s3_access_key.is_empty() || self.s3_secret_key.is_empty() {
            anyhow::bail!("s3 access key and secret key cannot be empty");
        }

        if self.s3_bucket.is_empty() {
            anyhow::bail!("s3 bucket cannot be empty");
        }

        if self.key_prefix().is_empty() {
            anyhow::bail!("s3 base path cannot be empty");
        }

        if self.s3_region.is_empty() {
            anyhow::bail!("s3 region cannot be empty");
        }

        for (name, url) in [
            ("bitbucket endpoint", &self.bitbucket_endpoint),
            ("s3 endpoint", &self.s3_endpoint),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.worker_count == 0 {
            anyhow::bail!("worker count must be greater than 0");
        }

        if let Some(dir) = &self.scratch_dir {
            if !dir.is_dir() {
                anyhow::bail!("scratch directory {} does not exist", dir.display());
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bitbucket_username", &self.bitbucket_username)
            .field("bitbucket_endpoint", &self.bitbucket_endpoint)
            .field("s3_access_key", &self.s3_access_key)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_base_path", &self.s3_base_path)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_region", &self.s3_region)
            .field("worker_count", &self.worker_count)
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

/// Current local time as `%Y-%m-%d-%H:%M`
pub fn default_base_path() -> String {
    chrono::Local::now().format("%Y-%m-%d-%H:%M").to_string()
}
