//! Scheduler layer for the runner
//!
//! The concurrency core: a fixed pool of workers draining a bounded queue of
//! backup jobs, each worker holding its own toolbox of collaborators.

pub mod job;
pub mod pool;
pub mod toolbox;

pub use job::BackupJob;
pub use pool::WorkerPool;
pub use toolbox::ResourceToolbox;
