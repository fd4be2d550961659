//! Per-worker collaborator bundle

use bitbackup_core::domain::repository::RepositoryDescriptor;
use std::sync::Arc;

use crate::service::{Archiver, RepositoryProvider, Uploader};

/// Everything a worker needs to execute backup jobs
///
/// Built once per worker by the pool's toolbox factory and dropped when the
/// worker exits. The archiver and uploader are owned outright because they
/// are not safe to share between concurrent jobs; the provider is shared
/// read-only across the whole pool.
pub struct ResourceToolbox {
    pub provider: Arc<dyn RepositoryProvider>,
    pub archiver: Box<dyn Archiver>,
    pub uploader: Box<dyn Uploader>,
    /// Object key prefix, without leading or trailing `/`
    key_prefix: String,
}

impl ResourceToolbox {
    pub fn new(
        provider: Arc<dyn RepositoryProvider>,
        archiver: Box<dyn Archiver>,
        uploader: Box<dyn Uploader>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            archiver,
            uploader,
            key_prefix: key_prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Object key for a repository: `<prefix>/<full_name>.tar.gz`
    pub fn object_key(&self, repository: &RepositoryDescriptor) -> String {
        if self.key_prefix.is_empty() {
            format!("{}.tar.gz", repository.identifier())
        } else {
            format!("{}/{}.tar.gz", self.key_prefix, repository.identifier())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{FakeArchiver, FakeProvider, FakeUploader, Probe, repo};

    fn toolbox(prefix: &str) -> ResourceToolbox {
        let probe = Probe::new();
        ResourceToolbox::new(
            Arc::new(FakeProvider::new(Vec::new())),
            Box::new(FakeArchiver::new(&probe)),
            Box::new(FakeUploader::new(&probe)),
            prefix,
        )
    }

    #[test]
    fn test_object_key_uses_prefix_and_full_name() {
        assert_eq!(
            toolbox("2024-01-01-12:30").object_key(&repo("widgets")),
            "2024-01-01-12:30/acme/widgets.tar.gz"
        );
    }

    #[test]
    fn test_object_key_trims_slashes() {
        assert_eq!(
            toolbox("/backups/nightly/").object_key(&repo("widgets")),
            "backups/nightly/acme/widgets.tar.gz"
        );
        assert_eq!(toolbox("").object_key(&repo("widgets")), "acme/widgets.tar.gz");
    }
}
