use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::domain::ApplicationId;
use super::held_jobs::AddOutcome;
use super::repository::JobLedgerRepository;
use super::service::{JobApplicationError, JobApplicationService, JobRequest, ReviewRequest};
use crate::accounts::{AccountRepository, Actor};
use crate::http::{JsonBody, OptionalJsonBody, error_response, flash, validation_response};
use crate::store::RepositoryError;

/// Job request submission and review endpoints.
pub fn job_router<S>(service: Arc<JobApplicationService<S>>) -> Router
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    Router::new()
        .route("/api/v1/jobs", get(overview_handler::<S>))
        .route(
            "/api/v1/jobs/applications",
            post(submit_handler::<S>).get(review_board_handler::<S>),
        )
        .route(
            "/api/v1/jobs/applications/:application_id",
            get(application_handler::<S>),
        )
        .route(
            "/api/v1/jobs/applications/:application_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/jobs/applications/:application_id/deny",
            post(deny_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn overview_handler<S>(
    State(service): State<Arc<JobApplicationService<S>>>,
    Actor(actor): Actor,
) -> Response
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    match service.overview(actor) {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<JobApplicationService<S>>>,
    Actor(actor): Actor,
    JsonBody(request): JsonBody<JobRequest>,
) -> Response
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    match service.submit(actor, request) {
        Ok(application) => {
            let message = format!(
                "Your application for {} has been submitted to the President for review!",
                application.job_title
            );
            flash(StatusCode::CREATED, "application", &application, message)
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn review_board_handler<S>(
    State(service): State<Arc<JobApplicationService<S>>>,
    Actor(actor): Actor,
) -> Response
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    match service.review_board(actor) {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn application_handler<S>(
    State(service): State<Arc<JobApplicationService<S>>>,
    Actor(actor): Actor,
    Path(application_id): Path<u64>,
) -> Response
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    match service.get(actor, ApplicationId(application_id)) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn approve_handler<S>(
    State(service): State<Arc<JobApplicationService<S>>>,
    Actor(actor): Actor,
    Path(application_id): Path<u64>,
    OptionalJsonBody(request): OptionalJsonBody<ReviewRequest>,
) -> Response
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    match service.approve(actor, ApplicationId(application_id), request) {
        Ok(outcome) => {
            let mut message = format!(
                "Application for {} by {} has been approved!",
                outcome.application.job_title, outcome.applicant_name
            );
            if outcome.grant == Some(AddOutcome::LimitReached) {
                message.push_str(" The applicant already holds the maximum number of jobs.");
            }
            flash(StatusCode::OK, "review", &outcome, message)
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn deny_handler<S>(
    State(service): State<Arc<JobApplicationService<S>>>,
    Actor(actor): Actor,
    Path(application_id): Path<u64>,
    OptionalJsonBody(request): OptionalJsonBody<ReviewRequest>,
) -> Response
where
    S: AccountRepository + JobLedgerRepository + 'static,
{
    match service.deny(actor, ApplicationId(application_id), request) {
        Ok(outcome) => {
            let message = format!(
                "Application for {} by {} has been denied.",
                outcome.application.job_title, outcome.applicant_name
            );
            flash(StatusCode::OK, "review", &outcome, message)
        }
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for JobApplicationError {
    fn into_response(self) -> Response {
        match self {
            JobApplicationError::Access(error) => error.into_response(),
            JobApplicationError::Validation(errors) => validation_response(&errors),
            JobApplicationError::LimitExceeded { .. }
            | JobApplicationError::DuplicatePending(_)
            | JobApplicationError::AlreadyHeld(_)
            | JobApplicationError::AlreadyReviewed(_)
            | JobApplicationError::Repository(RepositoryError::Conflict(_)) => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            JobApplicationError::NotFound(_)
            | JobApplicationError::Repository(RepositoryError::NotFound) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            JobApplicationError::Repository(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}
