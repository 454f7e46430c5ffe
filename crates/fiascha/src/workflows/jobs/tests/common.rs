use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::accounts::credentials::hash_password;
use crate::accounts::identity::ACCOUNT_HEADER;
use crate::accounts::{Account, AccountId, AccountRepository, NewAccount, Role};
use crate::clock::{Clock, ManualClock};
use crate::store::{InMemoryStore, RepositoryError};
use crate::workflows::jobs::{
    job_router, ApplicationId, HeldJobs, JobApplication, JobApplicationService, JobLedgerRepository,
    JobRequest, JobTitle, NewJobApplication, ReviewCommit,
};

pub(super) struct Portal {
    pub(super) service: Arc<JobApplicationService<InMemoryStore>>,
    pub(super) store: Arc<InMemoryStore>,
    pub(super) clock: Arc<ManualClock>,
    pub(super) president: AccountId,
    pub(super) citizen: AccountId,
}

pub(super) fn portal() -> Portal {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap(),
    ));
    let president = register(&store, clock.as_ref(), "president", Role::President, true);
    let citizen = register(&store, clock.as_ref(), "ada", Role::Citizen, false);
    Portal {
        service: Arc::new(JobApplicationService::new(store.clone(), clock.clone())),
        store,
        clock,
        president,
        citizen,
    }
}

pub(super) fn register(
    store: &InMemoryStore,
    clock: &dyn Clock,
    username: &str,
    role: Role,
    is_admin: bool,
) -> AccountId {
    store
        .insert_account(NewAccount {
            username: username.to_string(),
            email: format!("{username}@fiascha.gov"),
            credential_hash: hash_password("correct horse battery"),
            full_name: None,
            role,
            is_admin,
            created_at: clock.now(),
        })
        .expect("account inserted")
        .id
}

pub(super) fn account(store: &InMemoryStore, id: AccountId) -> Account {
    store
        .fetch_account(id)
        .expect("fetch succeeds")
        .expect("account present")
}

pub(super) fn give_jobs(store: &InMemoryStore, id: AccountId, jobs: &[JobTitle]) {
    store
        .replace_held_jobs(id, &HeldJobs::from(jobs.to_vec()))
        .expect("held jobs replaced");
}

pub(super) fn request(job: &str) -> JobRequest {
    JobRequest {
        job_title: job.to_string(),
        message: Some("I would like to serve.".to_string()),
    }
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    actor: Option<AccountId>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(actor) = actor {
        builder = builder.header(ACCOUNT_HEADER, actor.0.to_string());
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, actor: AccountId) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(ACCOUNT_HEADER, actor.0.to_string())
        .body(Body::empty())
        .expect("request builds")
}

/// A request with an identity but no body or content type.
pub(super) fn bare_request(method: &str, uri: &str, actor: AccountId) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(ACCOUNT_HEADER, actor.0.to_string())
        .body(Body::empty())
        .expect("request builds")
}

/// A JSON-typed request carrying the body verbatim, for payloads that do not parse.
pub(super) fn raw_json_request(
    method: &str,
    uri: &str,
    actor: AccountId,
    body: &'static str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACCOUNT_HEADER, actor.0.to_string())
        .body(Body::from(body))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router(portal: &Portal) -> axum::Router {
    job_router(portal.service.clone())
}

/// Real accounts, but every ledger write fails with the configured error and every lookup
/// comes back empty.
pub(super) struct FailingLedger {
    pub(super) accounts: InMemoryStore,
    pub(super) failure: RepositoryError,
}

impl FailingLedger {
    pub(super) fn new(failure: RepositoryError) -> (Self, AccountId) {
        let accounts = InMemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap());
        let citizen = register(&accounts, &clock, "ada", Role::Citizen, false);
        (Self { accounts, failure }, citizen)
    }
}

impl AccountRepository for FailingLedger {
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        self.accounts.insert_account(account)
    }

    fn update_account(&self, account: &Account) -> Result<(), RepositoryError> {
        self.accounts.update_account(account)
    }

    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        self.accounts.fetch_account(id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        self.accounts.find_by_username(username)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        self.accounts.find_by_email(email)
    }

    fn list_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        self.accounts.list_accounts()
    }
}

impl JobLedgerRepository for FailingLedger {
    fn insert_application(
        &self,
        _draft: NewJobApplication,
    ) -> Result<JobApplication, RepositoryError> {
        Err(self.failure.clone())
    }

    fn fetch_application(
        &self,
        _id: ApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(None)
    }

    fn find_pending(
        &self,
        _applicant: AccountId,
        _job: JobTitle,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(None)
    }

    fn applications_for(
        &self,
        _applicant: AccountId,
        _limit: usize,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        Err(self.failure.clone())
    }

    fn pending_applications(&self) -> Result<Vec<JobApplication>, RepositoryError> {
        Err(self.failure.clone())
    }

    fn reviewed_applications(
        &self,
        _limit: usize,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        Err(self.failure.clone())
    }

    fn commit_review(
        &self,
        _application: &JobApplication,
        _grant: Option<JobTitle>,
    ) -> Result<ReviewCommit, RepositoryError> {
        Err(self.failure.clone())
    }
}

/// Accounts from the shared store, with a hook that runs once right after a username lookup
/// so other work can land between a login's read and its write.
pub(super) struct LookupHook {
    store: Arc<InMemoryStore>,
    hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl LookupHook {
    pub(super) fn new(store: Arc<InMemoryStore>, hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            store,
            hook: Mutex::new(Some(Box::new(hook))),
        }
    }
}

impl AccountRepository for LookupHook {
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        self.store.insert_account(account)
    }

    fn update_account(&self, account: &Account) -> Result<(), RepositoryError> {
        self.store.update_account(account)
    }

    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        self.store.fetch_account(id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        let found = self.store.find_by_username(username)?;
        let hook = self.hook.lock().expect("hook lock").take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(found)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        self.store.find_by_email(email)
    }

    fn list_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        self.store.list_accounts()
    }
}
