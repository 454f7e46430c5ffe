use super::domain::{Account, AccountId, NewAccount};
use crate::store::RepositoryError;

/// Storage abstraction for citizen accounts.
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. Usernames and emails are unique.
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError>;
    /// Persist profile, access and login changes. Held jobs are left as stored; only the
    /// ledger's review commit writes them.
    fn update_account(&self, account: &Account) -> Result<(), RepositoryError>;
    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;
    fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;
    /// Every account ordered by username.
    fn list_accounts(&self) -> Result<Vec<Account>, RepositoryError>;
}
