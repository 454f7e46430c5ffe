use serde::Serialize;

use super::domain::{ApplicationId, JobApplication, JobTitle, NewJobApplication};
use super::held_jobs::{AddOutcome, HeldJobs};
use crate::accounts::AccountId;
use crate::store::RepositoryError;

/// Result of committing a review: the applicant's held jobs as stored afterwards and, for
/// approvals, what happened to the granted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCommit {
    pub held_jobs: HeldJobs,
    pub grant: Option<AddOutcome>,
}

/// Storage abstraction for the application ledger.
pub trait JobLedgerRepository: Send + Sync {
    /// Insert a pending application. At most one pending row may exist per
    /// (applicant, job); a second one is a `Conflict`.
    fn insert_application(
        &self,
        draft: NewJobApplication,
    ) -> Result<JobApplication, RepositoryError>;

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError>;

    fn find_pending(
        &self,
        applicant: AccountId,
        job: JobTitle,
    ) -> Result<Option<JobApplication>, RepositoryError>;

    /// The applicant's applications, newest first, at most `limit`.
    fn applications_for(
        &self,
        applicant: AccountId,
        limit: usize,
    ) -> Result<Vec<JobApplication>, RepositoryError>;

    /// Every pending application, newest first.
    fn pending_applications(&self) -> Result<Vec<JobApplication>, RepositoryError>;

    /// Reviewed applications by review time, newest first, at most `limit`.
    fn reviewed_applications(&self, limit: usize)
        -> Result<Vec<JobApplication>, RepositoryError>;

    /// Persist a reviewed application and, when `grant` is set, add that job to the
    /// applicant's stored held jobs, all in one commit. The stored row must still be
    /// pending, otherwise nothing is written and `Conflict` is returned.
    fn commit_review(
        &self,
        application: &JobApplication,
        grant: Option<JobTitle>,
    ) -> Result<ReviewCommit, RepositoryError>;
}
