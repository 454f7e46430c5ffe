use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::access::{load_actor, require, AccessError, Capability};
use super::credentials::{hash_password, verify_password};
use super::domain::{Account, AccountId, NewAccount, Role};
use super::repository::AccountRepository;
use crate::clock::Clock;
use crate::config::AdminBootstrap;
use crate::store::RepositoryError;
use crate::validation::{optional_text, FieldErrors};

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Administrative change to another account's rank or administrator flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessUpdate {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// Registration, login and administration of citizen accounts.
pub struct AccountService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AccountService<R>
where
    R: AccountRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Register a new citizen. New accounts are active, non-administrative `Citizen`s.
    pub fn register(&self, form: Registration) -> Result<Account, AccountServiceError> {
        let username = form.username.trim().to_string();
        let email = form.email.trim().to_ascii_lowercase();

        let mut errors = FieldErrors::new();
        if errors.require("username", &username, "Username is required") {
            errors.check_length(
                "username",
                &username,
                3,
                Some(64),
                "Username must be between 3 and 64 characters",
            );
        }
        if errors.require("email", &email, "Email is required") {
            errors.check_email("email", &email);
            errors.check_length(
                "email",
                &email,
                0,
                Some(120),
                "Email must be less than 120 characters",
            );
        }
        if errors.require("password", &form.password, "Password is required") {
            errors.check_length(
                "password",
                &form.password,
                8,
                None,
                "Password must be at least 8 characters long",
            );
        }
        if errors.require(
            "password_confirm",
            &form.password_confirm,
            "Please confirm your password",
        ) && form.password_confirm != form.password
        {
            errors.push("password_confirm", "Passwords must match");
        }

        if !errors.has("username") && self.repository.find_by_username(&username)?.is_some() {
            errors.push(
                "username",
                "Username already taken. Please choose a different one.",
            );
        }
        if !errors.has("email") && self.repository.find_by_email(&email)?.is_some() {
            errors.push(
                "email",
                "Email already registered. Please use a different email.",
            );
        }
        errors.into_result()?;

        let account = self
            .repository
            .insert_account(NewAccount {
                username,
                email,
                credential_hash: hash_password(&form.password),
                full_name: optional_text(form.full_name),
                role: Role::Citizen,
                is_admin: false,
                created_at: self.clock.now(),
            })
            .map_err(|error| match error {
                RepositoryError::Conflict(field) => AccountServiceError::Validation(
                    FieldErrors::single(field, format!("{field} already registered")),
                ),
                other => other.into(),
            })?;

        info!(account = %account.id, citizen_id = %account.citizen_id, "citizen registered");
        Ok(account)
    }

    /// Verify credentials and stamp the login time.
    pub fn authenticate(&self, credentials: Credentials) -> Result<Account, AccountServiceError> {
        let mut account = self
            .repository
            .find_by_username(credentials.username.trim())?
            .filter(|account| verify_password(&credentials.password, &account.credential_hash))
            .ok_or(AccountServiceError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AccessError::Inactive(account.id).into());
        }

        account.last_login = Some(self.clock.now());
        self.repository.update_account(&account)?;
        info!(account = %account.id, "citizen logged in");
        Ok(account)
    }

    pub fn profile(&self, actor: AccountId) -> Result<Account, AccountServiceError> {
        load_actor(self.repository.as_ref(), actor)
    }

    /// Active accounts other than the viewer, ordered by username.
    pub fn directory(&self, actor: AccountId) -> Result<Vec<Account>, AccountServiceError> {
        let viewer = load_actor::<_, AccountServiceError>(self.repository.as_ref(), actor)?;
        let accounts = self
            .repository
            .list_accounts()?
            .into_iter()
            .filter(|account| account.is_active && account.id != viewer.id)
            .collect();
        Ok(accounts)
    }

    pub fn update_access(
        &self,
        actor: AccountId,
        target: AccountId,
        update: AccessUpdate,
    ) -> Result<Account, AccountServiceError> {
        let admin = load_actor::<_, AccountServiceError>(self.repository.as_ref(), actor)?;
        require(&admin, Capability::ManageAccounts)?;

        let mut account = self
            .repository
            .fetch_account(target)?
            .ok_or(AccountServiceError::NotFound(target))?;
        if let Some(role) = update.role {
            account.role = role;
        }
        if let Some(is_admin) = update.is_admin {
            if !is_admin && account.id == admin.id {
                return Err(FieldErrors::single(
                    "is_admin",
                    "You cannot remove your own administrator rights.",
                )
                .into());
            }
            account.is_admin = is_admin;
        }
        self.repository.update_account(&account)?;

        info!(
            admin = %admin.id,
            account = %account.id,
            role = %account.role,
            is_admin = account.is_admin,
            "account access updated"
        );
        Ok(account)
    }

    /// Deactivate an account. Accounts are never deleted.
    pub fn deactivate(
        &self,
        actor: AccountId,
        target: AccountId,
    ) -> Result<Account, AccountServiceError> {
        let admin = load_actor::<_, AccountServiceError>(self.repository.as_ref(), actor)?;
        require(&admin, Capability::ManageAccounts)?;
        if admin.id == target {
            return Err(
                FieldErrors::single("account", "You cannot deactivate your own account.").into(),
            );
        }

        let mut account = self
            .repository
            .fetch_account(target)?
            .ok_or(AccountServiceError::NotFound(target))?;
        account.is_active = false;
        self.repository.update_account(&account)?;

        info!(admin = %admin.id, account = %account.id, "account deactivated");
        Ok(account)
    }

    /// Ensure the configured administrator exists. Returns the account when it was created.
    pub fn bootstrap_admin(
        &self,
        bootstrap: &AdminBootstrap,
    ) -> Result<Option<Account>, AccountServiceError> {
        if self
            .repository
            .find_by_username(bootstrap.username.trim())?
            .is_some()
        {
            return Ok(None);
        }

        let mut account = self.register(Registration {
            username: bootstrap.username.clone(),
            email: bootstrap.email.clone(),
            password: bootstrap.password.clone(),
            password_confirm: bootstrap.password.clone(),
            full_name: None,
        })?;
        account.role = Role::President;
        account.is_admin = true;
        self.repository.update_account(&account)?;

        info!(account = %account.id, "administrator bootstrapped");
        Ok(Some(account))
    }
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account {0} not found")]
    NotFound(AccountId),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
