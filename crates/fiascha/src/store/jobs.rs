use super::{InMemoryStore, RepositoryError};
use crate::accounts::AccountId;
use crate::workflows::jobs::held_jobs::column;
use crate::workflows::jobs::{
    AddOutcome, ApplicationId, JobApplication, JobLedgerRepository, JobTitle, NewJobApplication,
    ReviewCommit,
};

/// Newest first; ids break ties between rows stamped in the same instant.
fn newest_first(left: &JobApplication, right: &JobApplication) -> std::cmp::Ordering {
    right
        .created_at
        .cmp(&left.created_at)
        .then(right.id.cmp(&left.id))
}

impl JobLedgerRepository for InMemoryStore {
    fn insert_application(
        &self,
        draft: NewJobApplication,
    ) -> Result<JobApplication, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate = tables.applications.values().any(|row| {
            row.is_pending() && row.applicant == draft.applicant && row.job_title == draft.job_title
        });
        if duplicate {
            return Err(RepositoryError::Conflict("pending_application"));
        }

        let id = ApplicationId(tables.application_ids.next());
        let application = draft.into_pending(id);
        tables.applications.insert(id, application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.applications.get(&id).cloned())
    }

    fn find_pending(
        &self,
        applicant: AccountId,
        job: JobTitle,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .applications
            .values()
            .find(|row| row.is_pending() && row.applicant == applicant && row.job_title == job)
            .cloned())
    }

    fn applications_for(
        &self,
        applicant: AccountId,
        limit: usize,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        let tables = self.tables()?;
        let mut rows: Vec<JobApplication> = tables
            .applications
            .values()
            .filter(|row| row.applicant == applicant)
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        rows.truncate(limit);
        Ok(rows)
    }

    fn pending_applications(&self) -> Result<Vec<JobApplication>, RepositoryError> {
        let tables = self.tables()?;
        let mut rows: Vec<JobApplication> = tables
            .applications
            .values()
            .filter(|row| row.is_pending())
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        Ok(rows)
    }

    fn reviewed_applications(
        &self,
        limit: usize,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        let tables = self.tables()?;
        let mut rows: Vec<JobApplication> = tables
            .applications
            .values()
            .filter(|row| !row.is_pending())
            .cloned()
            .collect();
        rows.sort_by(|left, right| {
            right
                .reviewed_at
                .cmp(&left.reviewed_at)
                .then(right.id.cmp(&left.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    fn commit_review(
        &self,
        application: &JobApplication,
        grant: Option<JobTitle>,
    ) -> Result<ReviewCommit, RepositoryError> {
        let mut tables = self.tables()?;
        match tables.applications.get(&application.id) {
            Some(stored) if stored.is_pending() => {}
            Some(_) => return Err(RepositoryError::Conflict("application_reviewed")),
            None => return Err(RepositoryError::NotFound),
        }
        let row = tables
            .accounts
            .get_mut(&application.applicant)
            .ok_or(RepositoryError::NotFound)?;

        let mut held_jobs = column::decode(row.desired_jobs.as_deref());
        let grant = grant.map(|job| held_jobs.add(job));
        if grant == Some(AddOutcome::Added) {
            row.desired_jobs = column::encode(&held_jobs);
        }

        tables
            .applications
            .insert(application.id, application.clone());
        Ok(ReviewCommit { held_jobs, grant })
    }
}
