//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of backing up a single repository
///
/// Failures are values, not errors: a failed backup is recorded and the run
/// carries on with the next repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOutcome {
    Succeeded { repository: String, key: String },
    Failed { repository: String, reason: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }

    pub fn repository(&self) -> &str {
        match self {
            JobOutcome::Succeeded { repository, .. } => repository,
            JobOutcome::Failed { repository, .. } => repository,
        }
    }
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Repositories returned by the provider listing
    pub listed: usize,
    /// Jobs handed to the worker pool
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Whether submission stopped early because of an interrupt
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Repositories that were listed but never submitted
    pub fn skipped(&self) -> usize {
        self.listed.saturating_sub(self.submitted)
    }

    /// Jobs that ran to completion, successfully or not
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = JobOutcome::Succeeded {
            repository: "acme/widgets".to_string(),
            key: "base/acme/widgets.tar.gz".to_string(),
        };
        let failed = JobOutcome::Failed {
            repository: "acme/gadgets".to_string(),
            reason: "clone failed".to_string(),
        };

        assert!(ok.is_success());
        assert!(!failed.is_success());
        assert_eq!(failed.repository(), "acme/gadgets");
    }

    #[test]
    fn test_summary_counts() {
        let started_at = Utc::now();
        let summary = RunSummary {
            listed: 5,
            submitted: 3,
            succeeded: 2,
            failed: 1,
            cancelled: true,
            started_at,
            finished_at: started_at + chrono::Duration::seconds(4),
        };

        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.completed(), 3);
        assert_eq!(summary.elapsed().num_seconds(), 4);
    }
}
