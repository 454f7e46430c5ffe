use std::fmt;

use serde::Serialize;

use super::domain::{Account, AccountId, Role};
use super::repository::AccountRepository;
use crate::store::RepositoryError;

/// Actions gated by role or administrator status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ReviewJobApplications,
    WriteArticles,
    ManageCategories,
    ViewUnpublished,
    ManageAccounts,
}

impl Capability {
    pub const fn label(self) -> &'static str {
        match self {
            Capability::ReviewJobApplications => "review job applications",
            Capability::WriteArticles => "write articles",
            Capability::ManageCategories => "manage categories",
            Capability::ViewUnpublished => "view unpublished articles",
            Capability::ManageAccounts => "manage accounts",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The single capability table. Administrators hold every capability; officials and
/// journalists may additionally publish news.
pub fn permits(role: Role, is_admin: bool, capability: Capability) -> bool {
    if is_admin {
        return true;
    }
    match capability {
        Capability::WriteArticles => matches!(
            role,
            Role::Journalist | Role::Minister | Role::President
        ),
        Capability::ReviewJobApplications
        | Capability::ManageCategories
        | Capability::ViewUnpublished
        | Capability::ManageAccounts => false,
    }
}

/// Identity and authorization failures, shared by every workflow service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),
    #[error("account {0} has been deactivated")]
    Inactive(AccountId),
    #[error("you do not have permission to {0}")]
    PermissionDenied(Capability),
}

/// Load the acting account, refusing unknown and deactivated ones.
pub(crate) fn load_actor<R, E>(repository: &R, id: AccountId) -> Result<Account, E>
where
    R: AccountRepository + ?Sized,
    E: From<AccessError> + From<RepositoryError>,
{
    let account = repository
        .fetch_account(id)?
        .ok_or(AccessError::UnknownAccount(id))?;
    if !account.is_active {
        return Err(AccessError::Inactive(id).into());
    }
    Ok(account)
}

pub(crate) fn require(account: &Account, capability: Capability) -> Result<(), AccessError> {
    if account.can(capability) {
        Ok(())
    } else {
        Err(AccessError::PermissionDenied(capability))
    }
}
