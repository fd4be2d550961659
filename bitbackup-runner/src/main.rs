//! Bitbackup
//!
//! Backs up every repository of a Bitbucket user or team to an
//! S3-compatible object store.
//!
//! Architecture:
//! - Configuration: command-line flags with environment fallbacks
//! - Services: repository listing, git archiving and S3 upload behind traits
//! - Scheduler: a fixed worker pool fed through a bounded job queue
//! - Signal: SIGINT/SIGTERM/SIGQUIT stop new submissions, in-flight backups finish
//!
//! The orchestrator lists repositories once, submits one job per repository
//! and waits for the pool to drain.

mod banner;
mod config;
mod orchestrator;
mod scheduler;
mod service;
mod signal;

use anyhow::{Context, Result};
use bitbackup_client::{BitbucketClient, Credentials, S3Client};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, DEFAULT_WORKER_COUNT, default_base_path};
use crate::orchestrator::Orchestrator;
use crate::scheduler::ResourceToolbox;
use crate::service::{BitbucketProvider, GitArchiver, RepositoryProvider, S3Uploader};
use crate::signal::CancellationSignal;

#[derive(Parser)]
#[command(name = "bitbackup")]
#[command(about = "Backup Bitbucket repositories to a S3 compatible store", long_about = None)]
struct Cli {
    /// Bitbucket username or team name
    #[arg(long = "bb-username", env = "BITBACKUP_BB_USERNAME")]
    bb_username: String,

    /// Bitbucket password or team API key
    #[arg(long = "bb-password", env = "BITBACKUP_BB_PASSWORD", hide_env_values = true)]
    bb_password: String,

    /// Bitbucket API endpoint
    #[arg(
        long = "bb-endpoint",
        env = "BITBACKUP_BB_ENDPOINT",
        default_value = bitbackup_client::DEFAULT_BITBUCKET_ENDPOINT
    )]
    bb_endpoint: String,

    /// S3 access key
    #[arg(long = "s3-key", env = "BITBACKUP_S3_KEY")]
    s3_key: String,

    /// S3 secret key
    #[arg(long = "s3-secret", env = "BITBACKUP_S3_SECRET", hide_env_values = true)]
    s3_secret: String,

    /// S3 bucket
    #[arg(long = "s3-bucket", env = "BITBACKUP_S3_BUCKET")]
    s3_bucket: String,

    /// S3 base path (defaults to the current time)
    #[arg(long = "s3-base-path", env = "BITBACKUP_S3_BASE_PATH", default_value_t = default_base_path())]
    s3_base_path: String,

    /// S3 host
    #[arg(
        long = "s3-endpoint",
        env = "BITBACKUP_S3_ENDPOINT",
        default_value = bitbackup_client::s3::DEFAULT_S3_ENDPOINT
    )]
    s3_endpoint: String,

    /// S3 region used for request signing
    #[arg(
        long = "s3-region",
        env = "BITBACKUP_S3_REGION",
        default_value = bitbackup_client::s3::DEFAULT_S3_REGION
    )]
    s3_region: String,

    /// The number of worker threads
    #[arg(long = "workers", env = "BITBACKUP_WORKERS", default_value_t = DEFAULT_WORKER_COUNT)]
    worker_count: usize,

    /// Directory for temporary clones and archives
    #[arg(long = "scratch-dir", env = "BITBACKUP_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Print debug messages
    #[arg(long)]
    debug: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let mut config = Config::new(
            cli.bb_username,
            cli.bb_password,
            cli.s3_key,
            cli.s3_secret,
            cli.s3_bucket,
        );
        config.bitbucket_endpoint = cli.bb_endpoint;
        config.s3_base_path = cli.s3_base_path;
        config.s3_endpoint = cli.s3_endpoint;
        config.s3_region = cli.s3_region;
        config.worker_count = cli.worker_count;
        config.scratch_dir = cli.scratch_dir;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.debug {
        "bitbackup=debug,bitbackup_client=debug"
    } else {
        "bitbackup=info,bitbackup_client=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from(cli);
    config.validate().context("Invalid configuration")?;

    banner::print_header(&config);

    let cancellation =
        CancellationSignal::install().context("Failed to install signal handlers")?;

    let provider: Arc<dyn RepositoryProvider> = Arc::new(BitbucketProvider::new(
        BitbucketClient::new(
            config.bitbucket_endpoint.clone(),
            config.bitbucket_username.clone(),
            config.bitbucket_password.clone(),
        ),
    ));

    let toolbox_factory = {
        let config = config.clone();
        let provider = Arc::clone(&provider);
        move || build_toolbox(&config, Arc::clone(&provider))
    };

    let orchestrator = Orchestrator::new(provider, cancellation, config.worker_count);

    let summary = match orchestrator.run(toolbox_factory).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Backup failed: {:#}", e);
            return Err(e);
        }
    };

    info!(
        "Run complete: {} of {} backed up ({} failed, {} skipped)",
        summary.succeeded,
        summary.completed(),
        summary.failed,
        summary.skipped()
    );
    banner::print_footer(&summary);

    Ok(())
}

/// Builds one worker's toolbox
///
/// Every worker gets its own archiver and upload client; only the provider
/// is shared.
fn build_toolbox(config: &Config, provider: Arc<dyn RepositoryProvider>) -> Result<ResourceToolbox> {
    let s3 = S3Client::new(
        config.s3_endpoint.clone(),
        config.s3_bucket.clone(),
        Credentials::new(
            config.s3_access_key.clone(),
            config.s3_secret_key.clone(),
            config.s3_region.clone(),
        ),
    );

    let mut archiver = GitArchiver::new();
    if let Some(dir) = &config.scratch_dir {
        archiver = archiver.with_scratch_dir(dir);
    }

    Ok(ResourceToolbox::new(
        provider,
        Box::new(archiver),
        Box::new(S3Uploader::new(s3)),
        config.key_prefix(),
    ))
}
