//! Fiascha portal: citizen accounts, the job-application ledger, news, messaging and a
//! personal to-do list, each exposed as an axum router over a repository boundary.

pub mod accounts;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod store;
pub mod telemetry;
pub mod validation;
pub mod workflows;

pub use context::PortalContext;
