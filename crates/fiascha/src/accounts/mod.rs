//! Citizen accounts: registration, authentication, roles and the capability check that every
//! other workflow consults before mutating anything.

pub mod access;
pub mod credentials;
pub mod domain;
pub mod identity;
pub mod repository;
pub mod router;
pub mod service;

pub use access::{AccessError, Capability};
pub use domain::{Account, AccountId, AccountView, NewAccount, Role};
pub use identity::Actor;
pub use repository::AccountRepository;
pub use router::account_router;
pub use service::{
    AccessUpdate, AccountService, AccountServiceError, Credentials, Registration,
};
