//! In-memory persistence for every portal table.
//!
//! All tables sit behind one mutex so each repository call is a single critical section,
//! including multi-row commits such as a job review.

mod accounts;
mod jobs;
mod messaging;
mod news;
mod todo;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::accounts::{AccountId, AccountRepository};
use crate::workflows::jobs::{ApplicationId, JobApplication, JobLedgerRepository};
use crate::workflows::messaging::{Message, MessageId, MessageRepository};
use crate::workflows::news::{Article, ArticleId, Category, CategoryId, NewsRepository};
use crate::workflows::todo::{Task, TaskId, TodoCategory, TodoCategoryId, TodoRepository};

use self::accounts::AccountRow;

/// Error surfaced by repository implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness or state constraint refused the write; names the constraint.
    #[error("record already exists ({0})")]
    Conflict(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Every repository the portal needs, as one bound.
pub trait PortalStore:
    AccountRepository
    + JobLedgerRepository
    + MessageRepository
    + NewsRepository
    + TodoRepository
    + 'static
{
}

impl<T> PortalStore for T where
    T: AccountRepository
        + JobLedgerRepository
        + MessageRepository
        + NewsRepository
        + TodoRepository
        + 'static
{
}

/// Monotonic id source for one table, starting at 1.
#[derive(Debug, Default)]
struct Sequence(u64);

impl Sequence {
    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<AccountId, AccountRow>,
    account_ids: Sequence,
    applications: BTreeMap<ApplicationId, JobApplication>,
    application_ids: Sequence,
    messages: BTreeMap<MessageId, Message>,
    message_ids: Sequence,
    categories: BTreeMap<CategoryId, Category>,
    category_ids: Sequence,
    articles: BTreeMap<ArticleId, Article>,
    article_ids: Sequence,
    tasks: BTreeMap<TaskId, Task>,
    task_ids: Sequence,
    todo_categories: BTreeMap<TodoCategoryId, TodoCategory>,
    todo_category_ids: Sequence,
}

/// Process-local store backing every repository trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}
