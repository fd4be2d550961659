//! Service layer
//!
//! Collaborators a backup job needs: a repository provider, an archiver and
//! an uploader. Each is a trait so the concurrency core can be exercised
//! against test doubles, with one production implementation apiece.

mod archiver;
mod provider;
mod uploader;

#[cfg(test)]
pub mod testing;

// Re-export traits
pub use archiver::Archiver;
pub use provider::RepositoryProvider;
pub use uploader::Uploader;

// Re-export implementations
pub use archiver::{ArchiveHandle, GitArchiver};
pub use provider::BitbucketProvider;
pub use uploader::S3Uploader;
