//! Best-effort resource deletion
//!
//! Teardown never aborts: each delete is attempted, classified, logged and
//! tallied into a [`CleanupReport`].

use super::error::AwsError;
use aegis_common::ResourceKind;
use std::fmt;
use std::future::Future;
use tracing::{info, warn};

/// Result of a single resource cleanup operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupResult {
    /// Resource was successfully deleted
    Deleted,
    /// Resource was already deleted (not found)
    AlreadyAbsent,
    /// Cleanup failed with error
    Failed,
    /// Nothing to delete (e.g., nothing matched the discovery filter)
    Skipped,
}

/// Tally of cleanup outcomes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: usize,
    pub already_absent: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `(kind, id)` of every failed deletion
    pub failures: Vec<(ResourceKind, String)>,
}

impl CleanupReport {
    /// Record one outcome
    pub fn record(&mut self, kind: ResourceKind, id: &str, result: CleanupResult) {
        match result {
            CleanupResult::Deleted => self.deleted += 1,
            CleanupResult::AlreadyAbsent => self.already_absent += 1,
            CleanupResult::Skipped => self.skipped += 1,
            CleanupResult::Failed => {
                self.failed += 1;
                self.failures.push((kind, id.to_string()));
            }
        }
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: CleanupReport) {
        self.deleted += other.deleted;
        self.already_absent += other.already_absent;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deleted, {} already absent, {} failed",
            self.deleted, self.already_absent, self.failed
        )
    }
}

/// Run one delete and classify its outcome.
///
/// `Ok` maps to `Deleted`, a not-found error to `AlreadyAbsent`, and any
/// other error to `Failed` (logged, never propagated).
pub async fn best_effort<F, Fut>(kind: ResourceKind, id: &str, op: F) -> CleanupResult
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), AwsError>>,
{
    match op().await {
        Ok(()) => {
            info!(resource_type = %kind, resource_id = %id, "Deleted");
            CleanupResult::Deleted
        }
        Err(e) if e.is_not_found() => {
            info!(resource_type = %kind, resource_id = %id, "Already absent");
            CleanupResult::AlreadyAbsent
        }
        Err(e) => {
            warn!(
                resource_type = %kind,
                resource_id = %id,
                code = ?e.code(),
                error = %e,
                "Cleanup failed"
            );
            CleanupResult::Failed
        }
    }
}
