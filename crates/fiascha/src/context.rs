//! Explicit wiring of the store, clock and every workflow service.

use std::sync::Arc;

use axum::Router;

use crate::accounts::{account_router, AccountService};
use crate::clock::{Clock, SystemClock};
use crate::config::PortalConfig;
use crate::store::{InMemoryStore, PortalStore};
use crate::workflows::jobs::{job_router, JobApplicationService};
use crate::workflows::messaging::{message_router, MessageService};
use crate::workflows::news::{news_router, NewsService};
use crate::workflows::todo::{todo_router, TodoService};

/// Everything a request handler needs, built once at startup and shared by reference.
pub struct PortalContext<S> {
    store: Arc<S>,
    accounts: Arc<AccountService<S>>,
    jobs: Arc<JobApplicationService<S>>,
    messages: Arc<MessageService<S>>,
    news: Arc<NewsService<S>>,
    todo: Arc<TodoService<S>>,
}

impl PortalContext<InMemoryStore> {
    /// A fresh in-memory portal on the wall clock.
    pub fn in_memory(config: &PortalConfig) -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SystemClock),
            config,
        )
    }
}

impl<S> PortalContext<S>
where
    S: PortalStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: &PortalConfig) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(store.clone(), clock.clone())),
            jobs: Arc::new(JobApplicationService::new(store.clone(), clock.clone())),
            messages: Arc::new(MessageService::new(store.clone(), clock.clone())),
            news: Arc::new(NewsService::new(store.clone(), clock.clone(), config)),
            todo: Arc::new(TodoService::new(store.clone(), clock)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn accounts(&self) -> &AccountService<S> {
        &self.accounts
    }

    pub fn jobs(&self) -> &JobApplicationService<S> {
        &self.jobs
    }

    pub fn messages(&self) -> &MessageService<S> {
        &self.messages
    }

    pub fn news(&self) -> &NewsService<S> {
        &self.news
    }

    pub fn todo(&self) -> &TodoService<S> {
        &self.todo
    }

    /// Every workflow router merged into one.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(account_router(self.accounts.clone()))
            .merge(job_router(self.jobs.clone()))
            .merge(message_router(self.messages.clone()))
            .merge(news_router(self.news.clone()))
            .merge(todo_router(self.todo.clone()))
    }
}
