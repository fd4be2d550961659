//! Test doubles for the collaborator traits
//!
//! A shared [`Probe`] records what the doubles saw: which repositories were
//! archived and uploaded, how many archives were opened and released, and
//! how many jobs were in flight at once.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use bitbackup_core::domain::repository::{CloneEndpoint, RepositoryDescriptor};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

use crate::scheduler::ResourceToolbox;
use crate::service::{ArchiveHandle, Archiver, RepositoryProvider, Uploader};
use crate::signal::CancellationSignal;

/// Builds a descriptor for `acme/<name>` whose clone URL ends in `<name>`
pub fn repo(name: &str) -> RepositoryDescriptor {
    RepositoryDescriptor::new(
        format!("acme/{}", name),
        format!("https://git.test/acme/{}", name),
    )
}

pub fn repos(names: &[&str]) -> Vec<RepositoryDescriptor> {
    names.iter().map(|name| repo(name)).collect()
}

#[derive(Default)]
pub struct Probe {
    archived: Mutex<Vec<String>>,
    uploaded: Mutex<Vec<String>>,
    opened: AtomicUsize,
    released: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    toolboxes: AtomicUsize,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Names archived so far, in the order archiving finished
    pub fn archived(&self) -> Vec<String> {
        self.archived.lock().unwrap().clone()
    }

    pub fn archived_sorted(&self) -> Vec<String> {
        let mut names = self.archived();
        names.sort();
        names
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Highest number of jobs observed between archive start and release
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn toolboxes(&self) -> usize {
        self.toolboxes.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Dropped together with the fake archive it backs
struct ReleaseGuard {
    probe: Arc<Probe>,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.probe.released.fetch_add(1, Ordering::SeqCst);
        self.probe.leave();
    }
}

pub struct FakeProvider {
    repositories: Vec<RepositoryDescriptor>,
    unavailable: bool,
}

impl FakeProvider {
    pub fn new(repositories: Vec<RepositoryDescriptor>) -> Self {
        Self {
            repositories,
            unavailable: false,
        }
    }

    /// A provider whose listing always fails
    pub fn unavailable() -> Self {
        Self {
            repositories: Vec::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl RepositoryProvider for FakeProvider {
    async fn list_repositories(&self) -> Result<Vec<RepositoryDescriptor>> {
        if self.unavailable {
            bail!("listing unavailable");
        }
        Ok(self.repositories.clone())
    }

    fn clone_endpoint(&self, repository: &RepositoryDescriptor) -> Result<CloneEndpoint> {
        let link = repository
            .clone_link("https")
            .ok_or_else(|| anyhow!("no https link for {}", repository.identifier()))?;
        Ok(CloneEndpoint::new(link.href.clone()))
    }
}

/// Archiver that fabricates handles instead of cloning
///
/// Can be told to fail or panic for some repositories, to hold every job until a gate
/// permit is available, to announce each job as it starts, and to trigger a
/// cancellation signal when a given repository starts.
#[derive(Clone)]
pub struct FakeArchiver {
    probe: Arc<Probe>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    started: Option<mpsc::UnboundedSender<String>>,
    trigger: Option<(String, CancellationSignal)>,
    delay: Duration,
}

impl FakeArchiver {
    pub fn new(probe: &Arc<Probe>) -> Self {
        Self {
            probe: Arc::clone(probe),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            gate: None,
            started: None,
            trigger: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(mut self, names: &[&str]) -> Self {
        self.failing = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn panicking(mut self, names: &[&str]) -> Self {
        self.panicking = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn gated(mut self, gate: &Arc<Semaphore>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }

    pub fn announcing(mut self, started: mpsc::UnboundedSender<String>) -> Self {
        self.started = Some(started);
        self
    }

    pub fn triggering(mut self, name: &str, signal: &CancellationSignal) -> Self {
        self.trigger = Some((name.to_string(), signal.clone()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Archiver for FakeArchiver {
    async fn archive(&self, endpoint: &CloneEndpoint) -> Result<ArchiveHandle> {
        let name = endpoint.basename().to_string();
        if self.panicking.contains(&name) {
            panic!("archiver crashed on {}", name);
        }
        self.probe.enter();

        if let Some((target, signal)) = &self.trigger {
            if *target == name {
                signal.trigger();
            }
        }

        if let Some(started) = &self.started {
            let _ = started.send(name.clone());
        }

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.probe.archived.lock().unwrap().push(name.clone());

        if self.failing.contains(&name) {
            self.probe.leave();
            bail!("clone of {} failed", name);
        }

        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ArchiveHandle::new(
            PathBuf::from(format!("/fake/{}.tar.gz", name)),
            ReleaseGuard {
                probe: Arc::clone(&self.probe),
            },
        ))
    }
}

/// Uploader that records keys and fails for keys containing a given name
#[derive(Clone)]
pub struct FakeUploader {
    probe: Arc<Probe>,
    failing: HashSet<String>,
}

impl FakeUploader {
    pub fn new(probe: &Arc<Probe>) -> Self {
        Self {
            probe: Arc::clone(probe),
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, names: &[&str]) -> Self {
        self.failing = names.iter().map(|name| name.to_string()).collect();
        self
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, key: &str, archive: &Path) -> Result<()> {
        if self.failing.iter().any(|name| key.ends_with(&format!("/{}.tar.gz", name))) {
            bail!("upload of {} from {} rejected", key, archive.display());
        }
        self.probe.uploaded.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// A toolbox factory over the given doubles, counting toolboxes built
pub fn toolbox_factory(
    provider: Arc<dyn RepositoryProvider>,
    archiver: FakeArchiver,
    uploader: FakeUploader,
) -> impl Fn() -> Result<ResourceToolbox> {
    move || {
        archiver.probe.toolboxes.fetch_add(1, Ordering::SeqCst);
        Ok(ResourceToolbox::new(
            Arc::clone(&provider),
            Box::new(archiver.clone()),
            Box::new(uploader.clone()),
            "nightly",
        ))
    }
}

/// Shorthand for a factory whose provider only resolves clone links
pub fn simple_factory(
    probe: &Arc<Probe>,
    archiver: FakeArchiver,
) -> impl Fn() -> Result<ResourceToolbox> {
    toolbox_factory(
        Arc::new(FakeProvider::new(Vec::new())),
        archiver,
        FakeUploader::new(probe),
    )
}
