//! Job applications: citizens request one of the fixed civic jobs, administrators approve or
//! deny, and approvals grant the job into the applicant's capped held-jobs set.

pub mod domain;
pub mod held_jobs;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationStatus, JobApplication, JobTitle, NewJobApplication,
    TransitionError, UnknownJobTitle,
};
pub use held_jobs::{AddOutcome, HeldJobs, ToggleOutcome, MAX_HELD_JOBS};
pub use repository::{JobLedgerRepository, ReviewCommit};
pub use router::job_router;
pub use service::{
    ApplicationEntry, JobApplicationError, JobApplicationService, JobOverview, JobRequest,
    PollEntry, ReviewBoard, ReviewOutcome, ReviewRequest,
};
