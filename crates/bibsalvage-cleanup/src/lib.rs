//! Field cleanup jobs.
//!
//! A [`CleanupJob`] rewrites one [`BibEntry`] in place and reports every
//! effective mutation as a [`FieldChange`]. Jobs are composed with
//! [`CleanupWorker`], which runs them in the order given.

use bibsalvage_core::{BibEntry, CleanupJobKind, FieldChange};

pub mod doi;
pub mod eprint;

pub use doi::DoiCleanup;
pub use eprint::EprintCleanup;

/// A normalization policy applied to a single entry.
pub trait CleanupJob: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Apply the policy, returning the changes in mutation order.
    ///
    /// An entry that needs no change yields an empty vector.
    fn cleanup(&self, entry: &mut BibEntry) -> Vec<FieldChange>;
}

impl<J: CleanupJob + ?Sized> CleanupJob for Box<J> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn cleanup(&self, entry: &mut BibEntry) -> Vec<FieldChange> {
        (**self).cleanup(entry)
    }
}

/// Build the job for a configured kind.
pub fn job_for(kind: CleanupJobKind) -> Box<dyn CleanupJob> {
    match kind {
        CleanupJobKind::Eprint => Box::new(EprintCleanup),
        CleanupJobKind::Doi => Box::new(DoiCleanup),
    }
}

/// Runs a list of jobs over an entry, concatenating their changes.
#[derive(Default)]
pub struct CleanupWorker {
    jobs: Vec<Box<dyn CleanupJob>>,
}

impl CleanupWorker {
    pub fn new(jobs: Vec<Box<dyn CleanupJob>>) -> Self {
        Self { jobs }
    }

    pub fn from_kinds(kinds: &[CleanupJobKind]) -> Self {
        Self::new(kinds.iter().copied().map(job_for).collect())
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|j| j.name()).collect()
    }
}

impl CleanupJob for CleanupWorker {
    fn name(&self) -> &'static str {
        "worker"
    }

    fn cleanup(&self, entry: &mut BibEntry) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        for job in &self.jobs {
            let applied = job.cleanup(entry);
            tracing::debug!(job = job.name(), changes = applied.len(), "cleanup job finished");
            changes.extend(applied);
        }
        changes
    }
}

impl std::fmt::Debug for CleanupWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupWorker")
            .field("jobs", &self.job_names())
            .finish()
    }
}
