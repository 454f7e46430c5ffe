use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountId;

/// The fixed set of civic jobs a citizen may apply for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobTitle {
    Policeman,
    Soldier,
    Judge,
    Lawyer,
    Journalist,
    Coach,
}

impl JobTitle {
    pub const ALL: [JobTitle; 6] = [
        JobTitle::Policeman,
        JobTitle::Soldier,
        JobTitle::Judge,
        JobTitle::Lawyer,
        JobTitle::Journalist,
        JobTitle::Coach,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            JobTitle::Policeman => "Policeman",
            JobTitle::Soldier => "Soldier",
            JobTitle::Judge => "Judge",
            JobTitle::Lawyer => "Lawyer",
            JobTitle::Journalist => "Journalist",
            JobTitle::Coach => "Coach",
        }
    }
}

impl fmt::Display for JobTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not an available job")]
pub struct UnknownJobTitle(pub String);

impl FromStr for JobTitle {
    type Err = UnknownJobTitle;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        JobTitle::ALL
            .into_iter()
            .find(|job| job.label() == trimmed)
            .ok_or_else(|| UnknownJobTitle(trimmed.to_string()))
    }
}

/// Store-assigned application identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an application: `Pending` moves once to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Denied,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Denied => "denied",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A citizen's request for a job and, once reviewed, the administrator's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub applicant: AccountId,
    pub job_title: JobTitle,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub response: Option<String>,
    pub reviewer: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl JobApplication {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    pub fn approve(
        &mut self,
        reviewer: AccountId,
        response: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.review(ApplicationStatus::Approved, reviewer, response, at)
    }

    pub fn deny(
        &mut self,
        reviewer: AccountId,
        response: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.review(ApplicationStatus::Denied, reviewer, response, at)
    }

    fn review(
        &mut self,
        outcome: ApplicationStatus,
        reviewer: AccountId,
        response: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                id: self.id,
                status: self.status,
            });
        }
        self.status = outcome;
        self.reviewer = Some(reviewer);
        self.reviewed_at = Some(at);
        self.response = response;
        Ok(())
    }
}

/// Raised when a reviewed application is reviewed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("application {id} has already been {status}")]
pub struct TransitionError {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
}

/// Insert payload; the store assigns the id and the record starts pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobApplication {
    pub applicant: AccountId,
    pub job_title: JobTitle,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewJobApplication {
    pub fn into_pending(self, id: ApplicationId) -> JobApplication {
        JobApplication {
            id,
            applicant: self.applicant,
            job_title: self.job_title,
            message: self.message,
            status: ApplicationStatus::Pending,
            response: None,
            reviewer: None,
            created_at: self.created_at,
            reviewed_at: None,
        }
    }
}
