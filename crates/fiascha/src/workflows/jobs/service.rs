use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    ApplicationId, JobApplication, JobTitle, NewJobApplication, TransitionError,
};
use super::held_jobs::{AddOutcome, HeldJobs, MAX_HELD_JOBS};
use super::repository::JobLedgerRepository;
use crate::accounts::access::{load_actor, require};
use crate::accounts::{AccessError, Account, AccountId, AccountRepository, Capability};
use crate::clock::Clock;
use crate::store::RepositoryError;
use crate::validation::{optional_text, FieldErrors};

const RECENT_APPLICATIONS: usize = 5;
const REVIEWED_HISTORY: usize = 20;
const MAX_MESSAGE_CHARS: usize = 1000;

/// Citizen-submitted job request. The title arrives as text so unknown titles surface as a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Administrator's review input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub response: Option<String>,
}

/// An application with the names of the people involved, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationEntry {
    #[serde(flatten)]
    pub application: JobApplication,
    pub applicant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollEntry {
    pub job: JobTitle,
    pub count: usize,
}

/// What a citizen sees on the jobs page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOverview {
    pub available_jobs: Vec<JobTitle>,
    pub poll: Vec<PollEntry>,
    pub total_selections: usize,
    pub held_jobs: HeldJobs,
    pub pending: Vec<JobApplication>,
    pub recent: Vec<JobApplication>,
}

/// The administrator's review queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewBoard {
    pub pending: Vec<ApplicationEntry>,
    pub reviewed: Vec<ApplicationEntry>,
    pub pending_count: usize,
}

/// A committed review decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub application: JobApplication,
    pub applicant_name: String,
    pub held_jobs: HeldJobs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant: Option<AddOutcome>,
}

/// Ledger service: validates submissions and drives the pending → approved/denied transitions.
pub struct JobApplicationService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> JobApplicationService<S>
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Submit a request for `job_title` on behalf of `applicant`.
    ///
    /// Refused when the applicant already holds the maximum number of jobs, already has a
    /// pending request for the same job, or already holds it, checked in that order.
    pub fn submit(
        &self,
        applicant: AccountId,
        request: JobRequest,
    ) -> Result<JobApplication, JobApplicationError> {
        let account = load_actor::<_, JobApplicationError>(self.store.as_ref(), applicant)?;

        let mut errors = FieldErrors::new();
        let message = optional_text(request.message);
        if let Some(text) = &message {
            errors.check_length(
                "message",
                text,
                0,
                Some(MAX_MESSAGE_CHARS),
                "Message must be less than 1000 characters",
            );
        }
        let job = match request.job_title.parse::<JobTitle>() {
            Ok(job) => {
                errors.into_result()?;
                job
            }
            Err(err) => {
                if request.job_title.trim().is_empty() {
                    errors.push("job_title", "Please choose a job");
                } else {
                    errors.push("job_title", err.to_string());
                }
                return Err(errors.into());
            }
        };

        if account.held_jobs.is_full() {
            return Err(JobApplicationError::LimitExceeded {
                held: account.held_jobs.len(),
                limit: MAX_HELD_JOBS,
            });
        }
        if self.store.find_pending(account.id, job)?.is_some() {
            return Err(JobApplicationError::DuplicatePending(job));
        }
        if account.holds(job) {
            return Err(JobApplicationError::AlreadyHeld(job));
        }

        let application = self
            .store
            .insert_application(NewJobApplication {
                applicant: account.id,
                job_title: job,
                message,
                created_at: self.clock.now(),
            })
            .map_err(|error| match error {
                RepositoryError::Conflict(_) => JobApplicationError::DuplicatePending(job),
                other => other.into(),
            })?;

        info!(
            application = %application.id,
            applicant = %account.id,
            job = %job,
            "job application submitted"
        );
        Ok(application)
    }

    /// Approve a pending application and grant the job to the applicant.
    ///
    /// An applicant who reached the cap through other approvals keeps the approval on record
    /// but does not gain the job; the outcome reports `LimitReached`.
    pub fn approve(
        &self,
        reviewer: AccountId,
        id: ApplicationId,
        request: ReviewRequest,
    ) -> Result<ReviewOutcome, JobApplicationError> {
        let admin = self.reviewer(reviewer)?;
        let mut application = self.application(id)?;

        application.approve(admin.id, optional_text(request.response), self.clock.now())?;
        let outcome = self.commit(application, true)?;

        match outcome.grant {
            Some(AddOutcome::LimitReached) => warn!(
                application = %outcome.application.id,
                applicant = %outcome.application.applicant,
                job = %outcome.application.job_title,
                "approved application not granted: applicant already holds the maximum number of jobs"
            ),
            _ => info!(
                application = %outcome.application.id,
                reviewer = %admin.id,
                job = %outcome.application.job_title,
                "job application approved"
            ),
        }
        Ok(outcome)
    }

    /// Deny a pending application. A reason is mandatory.
    pub fn deny(
        &self,
        reviewer: AccountId,
        id: ApplicationId,
        request: ReviewRequest,
    ) -> Result<ReviewOutcome, JobApplicationError> {
        let admin = self.reviewer(reviewer)?;
        let mut application = self.application(id)?;

        let response = optional_text(request.response).ok_or_else(|| {
            FieldErrors::single(
                "response",
                "Please provide a reason for denying the application.",
            )
        })?;

        application.deny(admin.id, Some(response), self.clock.now())?;
        let outcome = self.commit(application, false)?;

        info!(
            application = %outcome.application.id,
            reviewer = %admin.id,
            job = %outcome.application.job_title,
            "job application denied"
        );
        Ok(outcome)
    }

    pub fn overview(&self, actor: AccountId) -> Result<JobOverview, JobApplicationError> {
        let account = load_actor::<_, JobApplicationError>(self.store.as_ref(), actor)?;

        let accounts = self.store.list_accounts()?;
        let poll: Vec<PollEntry> = JobTitle::ALL
            .iter()
            .map(|job| PollEntry {
                job: *job,
                count: accounts.iter().filter(|other| other.holds(*job)).count(),
            })
            .collect();
        let total_selections = poll.iter().map(|entry| entry.count).sum();

        let pending = self
            .store
            .applications_for(account.id, usize::MAX)?
            .into_iter()
            .filter(JobApplication::is_pending)
            .collect();
        let recent = self
            .store
            .applications_for(account.id, RECENT_APPLICATIONS)?;

        Ok(JobOverview {
            available_jobs: JobTitle::ALL.to_vec(),
            poll,
            total_selections,
            held_jobs: account.held_jobs,
            pending,
            recent,
        })
    }

    pub fn review_board(&self, actor: AccountId) -> Result<ReviewBoard, JobApplicationError> {
        self.reviewer(actor)?;

        let names = self.display_names()?;
        let pending: Vec<ApplicationEntry> = self
            .store
            .pending_applications()?
            .into_iter()
            .map(|application| entry(application, &names))
            .collect();
        let reviewed = self
            .store
            .reviewed_applications(REVIEWED_HISTORY)?
            .into_iter()
            .map(|application| entry(application, &names))
            .collect();

        Ok(ReviewBoard {
            pending_count: pending.len(),
            pending,
            reviewed,
        })
    }

    /// A single application, visible to its applicant and to reviewers.
    pub fn get(
        &self,
        actor: AccountId,
        id: ApplicationId,
    ) -> Result<ApplicationEntry, JobApplicationError> {
        let account = load_actor::<_, JobApplicationError>(self.store.as_ref(), actor)?;
        let application = self.application(id)?;
        if application.applicant != account.id {
            require(&account, Capability::ReviewJobApplications)?;
        }
        let names = self.display_names()?;
        Ok(entry(application, &names))
    }

    fn reviewer(&self, actor: AccountId) -> Result<Account, JobApplicationError> {
        let account = load_actor::<_, JobApplicationError>(self.store.as_ref(), actor)?;
        require(&account, Capability::ReviewJobApplications)?;
        Ok(account)
    }

    fn application(&self, id: ApplicationId) -> Result<JobApplication, JobApplicationError> {
        self.store
            .fetch_application(id)?
            .ok_or(JobApplicationError::NotFound(id))
    }

    fn commit(
        &self,
        application: JobApplication,
        grant: bool,
    ) -> Result<ReviewOutcome, JobApplicationError> {
        let applicant = self
            .store
            .fetch_account(application.applicant)?
            .ok_or(RepositoryError::NotFound)?;
        let grant = grant.then_some(application.job_title);

        let commit = match self.store.commit_review(&application, grant) {
            Ok(commit) => commit,
            Err(RepositoryError::Conflict(_)) => {
                let status = self.application(application.id)?.status;
                return Err(TransitionError {
                    id: application.id,
                    status,
                }
                .into());
            }
            Err(other) => return Err(other.into()),
        };

        Ok(ReviewOutcome {
            applicant_name: applicant.display_name().to_string(),
            application,
            held_jobs: commit.held_jobs,
            grant: commit.grant,
        })
    }

    fn display_names(&self) -> Result<HashMap<AccountId, String>, JobApplicationError> {
        Ok(self
            .store
            .list_accounts()?
            .into_iter()
            .map(|account| (account.id, account.display_name().to_string()))
            .collect())
    }
}

fn entry(application: JobApplication, names: &HashMap<AccountId, String>) -> ApplicationEntry {
    let applicant_name = names
        .get(&application.applicant)
        .cloned()
        .unwrap_or_else(|| format!("citizen #{}", application.applicant));
    let reviewer_name = application
        .reviewer
        .and_then(|reviewer| names.get(&reviewer).cloned());
    ApplicationEntry {
        application,
        applicant_name,
        reviewer_name,
    }
}

/// Error raised by the job application service.
#[derive(Debug, thiserror::Error)]
pub enum JobApplicationError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("you already hold {held} approved jobs; the limit is {limit}")]
    LimitExceeded { held: usize, limit: usize },
    #[error("you already have a pending application for {0}")]
    DuplicatePending(JobTitle),
    #[error("you already have {0} as an approved job")]
    AlreadyHeld(JobTitle),
    #[error("job application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    AlreadyReviewed(#[from] TransitionError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
