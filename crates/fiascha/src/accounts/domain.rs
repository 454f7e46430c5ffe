use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::access::{permits, Capability};
use crate::workflows::jobs::{HeldJobs, JobTitle};

/// Store-assigned account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Civic rank of a citizen. Administrative rights are tracked separately on the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Citizen,
    Journalist,
    Minister,
    President,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Citizen => "Citizen",
            Role::Journalist => "Journalist",
            Role::Minister => "Minister",
            Role::President => "President",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A registered citizen.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub credential_hash: String,
    pub citizen_id: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_admin: bool,
    pub is_active: bool,
    pub held_jobs: HeldJobs,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    /// Full name when one was given, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }

    pub fn can(&self, capability: Capability) -> bool {
        permits(self.role, self.is_admin, capability)
    }

    pub fn holds(&self, job: JobTitle) -> bool {
        self.held_jobs.contains(job)
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            citizen_id: self.citizen_id.clone(),
            full_name: self.full_name.clone(),
            display_name: self.display_name().to_string(),
            role: self.role,
            is_admin: self.is_admin,
            is_active: self.is_active,
            held_jobs: self.held_jobs.to_vec(),
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Insert payload; the store assigns the id and citizen id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub credential_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Citizen ids read `FSC-<year>-<sequence>`, the sequence padded to three digits.
pub fn citizen_id(registered_at: DateTime<Utc>, sequence: usize) -> String {
    format!("FSC-{}-{:03}", registered_at.year(), sequence)
}

/// Public representation of an account. Never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub citizen_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub display_name: String,
    pub role: Role,
    pub is_admin: bool,
    pub is_active: bool,
    pub held_jobs: Vec<JobTitle>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn citizen_id_pads_sequence() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(citizen_id(at, 1), "FSC-2026-001");
        assert_eq!(citizen_id(at, 42), "FSC-2026-042");
        assert_eq!(citizen_id(at, 1234), "FSC-2026-1234");
    }

    #[test]
    fn role_serializes_as_label() {
        let json = serde_json::to_string(&Role::President).expect("serializes");
        assert_eq!(json, "\"President\"");
        let parsed: Role = serde_json::from_str("\"Journalist\"").expect("parses");
        assert_eq!(parsed, Role::Journalist);
    }
}
