use chrono::{DateTime, Utc};

use super::{InMemoryStore, RepositoryError, Tables};
use crate::accounts::domain::citizen_id;
use crate::accounts::{Account, AccountId, AccountRepository, NewAccount, Role};
#[cfg(test)]
use crate::workflows::jobs::held_jobs::HeldJobs;
use crate::workflows::jobs::held_jobs::column;

/// Stored shape of an account: held jobs live in a nullable JSON text column.
#[derive(Debug, Clone)]
pub(super) struct AccountRow {
    id: AccountId,
    username: String,
    email: String,
    credential_hash: String,
    citizen_id: String,
    full_name: Option<String>,
    role: Role,
    is_admin: bool,
    is_active: bool,
    pub(super) desired_jobs: Option<String>,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl AccountRow {
    fn from_account(account: &Account, desired_jobs: Option<String>) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            credential_hash: account.credential_hash.clone(),
            citizen_id: account.citizen_id.clone(),
            full_name: account.full_name.clone(),
            role: account.role,
            is_admin: account.is_admin,
            is_active: account.is_active,
            desired_jobs,
            created_at: account.created_at,
            last_login: account.last_login,
        }
    }

    pub(super) fn to_account(&self) -> Account {
        Account {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            credential_hash: self.credential_hash.clone(),
            citizen_id: self.citizen_id.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            is_admin: self.is_admin,
            is_active: self.is_active,
            held_jobs: column::decode(self.desired_jobs.as_deref()),
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<AccountId>) -> bool {
        self.accounts
            .values()
            .any(|row| row.username == username && Some(row.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<AccountId>) -> bool {
        self.accounts
            .values()
            .any(|row| row.email.eq_ignore_ascii_case(email) && Some(row.id) != except)
    }
}

impl InMemoryStore {
    /// Overwrite an account's held jobs directly, bypassing the ledger.
    #[cfg(test)]
    pub(crate) fn replace_held_jobs(
        &self,
        id: AccountId,
        held_jobs: &HeldJobs,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let row = tables
            .accounts
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        row.desired_jobs = column::encode(held_jobs);
        Ok(())
    }
}

impl AccountRepository for InMemoryStore {
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.username_taken(&account.username, None) {
            return Err(RepositoryError::Conflict("username"));
        }
        if tables.email_taken(&account.email, None) {
            return Err(RepositoryError::Conflict("email"));
        }

        let id = AccountId(tables.account_ids.next());
        let sequence = tables.accounts.len() + 1;
        let row = AccountRow {
            id,
            citizen_id: citizen_id(account.created_at, sequence),
            username: account.username,
            email: account.email,
            credential_hash: account.credential_hash,
            full_name: account.full_name,
            role: account.role,
            is_admin: account.is_admin,
            is_active: true,
            desired_jobs: None,
            created_at: account.created_at,
            last_login: None,
        };
        let stored = row.to_account();
        tables.accounts.insert(id, row);
        Ok(stored)
    }

    fn update_account(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let desired_jobs = tables
            .accounts
            .get(&account.id)
            .ok_or(RepositoryError::NotFound)?
            .desired_jobs
            .clone();
        if tables.username_taken(&account.username, Some(account.id)) {
            return Err(RepositoryError::Conflict("username"));
        }
        if tables.email_taken(&account.email, Some(account.id)) {
            return Err(RepositoryError::Conflict("email"));
        }
        tables
            .accounts
            .insert(account.id, AccountRow::from_account(account, desired_jobs));
        Ok(())
    }

    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.accounts.get(&id).map(AccountRow::to_account))
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .accounts
            .values()
            .find(|row| row.username == username)
            .map(AccountRow::to_account))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .accounts
            .values()
            .find(|row| row.email.eq_ignore_ascii_case(email))
            .map(AccountRow::to_account))
    }

    fn list_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        let tables = self.tables()?;
        let mut accounts: Vec<Account> = tables.accounts.values().map(AccountRow::to_account).collect();
        accounts.sort_by(|left, right| left.username.cmp(&right.username));
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::workflows::jobs::{HeldJobs, JobTitle};

    fn draft(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            credential_hash: "sha256$1$00$00".to_string(),
            full_name: None,
            role: Role::Citizen,
            is_admin: false,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn insert_assigns_ids_and_citizen_numbers() {
        let store = InMemoryStore::new();
        let first = store.insert_account(draft("ada", "ada@fiascha.gov")).unwrap();
        let second = store.insert_account(draft("bo", "bo@fiascha.gov")).unwrap();

        assert_eq!(first.id, AccountId(1));
        assert_eq!(second.id, AccountId(2));
        assert_eq!(first.citizen_id, "FSC-2025-001");
        assert_eq!(second.citizen_id, "FSC-2025-002");
        assert!(first.is_active);
        assert!(first.held_jobs.is_empty());
    }

    #[test]
    fn insert_rejects_duplicate_username_and_email() {
        let store = InMemoryStore::new();
        store.insert_account(draft("ada", "ada@fiascha.gov")).unwrap();

        assert_eq!(
            store.insert_account(draft("ada", "other@fiascha.gov")),
            Err(RepositoryError::Conflict("username"))
        );
        assert_eq!(
            store.insert_account(draft("other", "ADA@fiascha.gov")),
            Err(RepositoryError::Conflict("email"))
        );
    }

    #[test]
    fn held_jobs_survive_the_text_column() {
        let store = InMemoryStore::new();
        let account = store.insert_account(draft("ada", "ada@fiascha.gov")).unwrap();
        store
            .replace_held_jobs(
                account.id,
                &HeldJobs::from(vec![JobTitle::Judge, JobTitle::Coach]),
            )
            .unwrap();

        let stored = store.fetch_account(account.id).unwrap().unwrap();
        assert_eq!(stored.held_jobs.to_vec(), vec![JobTitle::Judge, JobTitle::Coach]);
        let raw = store.tables().unwrap().accounts[&account.id].desired_jobs.clone();
        assert_eq!(raw.as_deref(), Some(r#"["Judge","Coach"]"#));
    }

    #[test]
    fn account_updates_never_touch_held_jobs() {
        let store = InMemoryStore::new();
        let account = store.insert_account(draft("ada", "ada@fiascha.gov")).unwrap();
        store
            .replace_held_jobs(account.id, &HeldJobs::from(vec![JobTitle::Judge]))
            .unwrap();

        let mut stale = account.clone();
        stale.held_jobs = HeldJobs::from(vec![JobTitle::Coach]);
        stale.last_login = Some(Utc.with_ymd_and_hms(2025, 9, 2, 8, 0, 0).unwrap());
        store.update_account(&stale).unwrap();

        let stored = store.fetch_account(account.id).unwrap().unwrap();
        assert_eq!(stored.held_jobs.to_vec(), vec![JobTitle::Judge]);
        assert_eq!(stored.last_login, stale.last_login);
    }

    #[test]
    fn list_orders_by_username() {
        let store = InMemoryStore::new();
        store.insert_account(draft("zed", "zed@fiascha.gov")).unwrap();
        store.insert_account(draft("ada", "ada@fiascha.gov")).unwrap();

        let names: Vec<String> = store
            .list_accounts()
            .unwrap()
            .into_iter()
            .map(|account| account.username)
            .collect();
        assert_eq!(names, vec!["ada", "zed"]);
    }
}
