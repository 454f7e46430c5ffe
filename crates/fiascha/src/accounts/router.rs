use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};

use super::domain::{AccountId, AccountView};
use super::identity::Actor;
use super::repository::AccountRepository;
use super::service::{AccessUpdate, AccountService, AccountServiceError, Credentials, Registration};
use crate::http::{JsonBody, error_response, flash, validation_response};
use crate::store::RepositoryError;

/// Registration, login and account administration endpoints.
pub fn account_router<R>(service: Arc<AccountService<R>>) -> Router
where
    R: AccountRepository + 'static,
{
    Router::new()
        .route("/api/v1/auth/register", post(register_handler::<R>))
        .route("/api/v1/auth/login", post(login_handler::<R>))
        .route("/api/v1/accounts", get(directory_handler::<R>))
        .route("/api/v1/accounts/me", get(me_handler::<R>))
        .route("/api/v1/accounts/:account_id", patch(update_handler::<R>))
        .route(
            "/api/v1/accounts/:account_id/deactivate",
            post(deactivate_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    JsonBody(form): JsonBody<Registration>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.register(form) {
        Ok(account) => flash(
            StatusCode::CREATED,
            "account",
            &account.view(),
            "Registration successful! You can now log in.",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn login_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.authenticate(credentials) {
        Ok(account) => {
            let message = format!("Welcome back, {}!", account.username);
            flash(StatusCode::OK, "account", &account.view(), message)
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn me_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Actor(actor): Actor,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.profile(actor) {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn directory_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Actor(actor): Actor,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.directory(actor) {
        Ok(accounts) => {
            let views: Vec<AccountView> = accounts.iter().map(|account| account.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Actor(actor): Actor,
    Path(account_id): Path<u64>,
    JsonBody(update): JsonBody<AccessUpdate>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.update_access(actor, AccountId(account_id), update) {
        Ok(account) => {
            let message = format!("Access for {} updated.", account.display_name());
            flash(StatusCode::OK, "account", &account.view(), message)
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn deactivate_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Actor(actor): Actor,
    Path(account_id): Path<u64>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.deactivate(actor, AccountId(account_id)) {
        Ok(account) => {
            let message = format!("{} has been deactivated.", account.display_name());
            flash(StatusCode::OK, "account", &account.view(), message)
        }
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for AccountServiceError {
    fn into_response(self) -> Response {
        match self {
            AccountServiceError::Access(error) => error.into_response(),
            AccountServiceError::Validation(errors) => validation_response(&errors),
            AccountServiceError::InvalidCredentials => {
                error_response(StatusCode::UNAUTHORIZED, self.to_string())
            }
            AccountServiceError::NotFound(_)
            | AccountServiceError::Repository(RepositoryError::NotFound) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            AccountServiceError::Repository(RepositoryError::Conflict(_)) => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            AccountServiceError::Repository(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}
