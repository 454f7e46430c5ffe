use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::MessageId;
use super::repository::MessageRepository;
use super::service::{Compose, MessageService, MessagingError};
use crate::accounts::{AccountRepository, Actor};
use crate::http::{JsonBody, error_response, flash, validation_response};
use crate::store::RepositoryError;

/// Inbox, outbox and compose endpoints.
pub fn message_router<S>(service: Arc<MessageService<S>>) -> Router
where
    S: AccountRepository + MessageRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/messages",
            get(inbox_handler::<S>).post(compose_handler::<S>),
        )
        .route("/api/v1/messages/sent", get(sent_handler::<S>))
        .route(
            "/api/v1/messages/mark-all-read",
            post(mark_all_read_handler::<S>),
        )
        .route(
            "/api/v1/messages/:message_id",
            get(view_handler::<S>).delete(delete_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn inbox_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Actor(actor): Actor,
) -> Response
where
    S: AccountRepository + MessageRepository + 'static,
{
    match service.inbox(actor) {
        Ok(inbox) => (StatusCode::OK, Json(inbox)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn sent_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Actor(actor): Actor,
) -> Response
where
    S: AccountRepository + MessageRepository + 'static,
{
    match service.sent(actor) {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn compose_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Actor(actor): Actor,
    JsonBody(form): JsonBody<Compose>,
) -> Response
where
    S: AccountRepository + MessageRepository + 'static,
{
    match service.compose(actor, form) {
        Ok(entry) => {
            let message = format!("Message sent to {}!", entry.recipient_name);
            flash(StatusCode::CREATED, "sent", &entry, message)
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn view_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Actor(actor): Actor,
    Path(message_id): Path<u64>,
) -> Response
where
    S: AccountRepository + MessageRepository + 'static,
{
    match service.view(actor, MessageId(message_id)) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Actor(actor): Actor,
    Path(message_id): Path<u64>,
) -> Response
where
    S: AccountRepository + MessageRepository + 'static,
{
    match service.delete(actor, MessageId(message_id)) {
        Ok(message) => flash(
            StatusCode::OK,
            "deleted",
            &message.id,
            "Message deleted successfully.",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn mark_all_read_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Actor(actor): Actor,
) -> Response
where
    S: AccountRepository + MessageRepository + 'static,
{
    match service.mark_all_read(actor) {
        Ok(updated) => {
            let payload = json!({
                "updated": updated,
                "message": "All messages marked as read.",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for MessagingError {
    fn into_response(self) -> Response {
        match self {
            MessagingError::Access(error) => error.into_response(),
            MessagingError::Validation(errors) => validation_response(&errors),
            MessagingError::NotParticipant(_) => {
                error_response(StatusCode::FORBIDDEN, self.to_string())
            }
            MessagingError::NotFound(_)
            | MessagingError::RecipientNotFound(_)
            | MessagingError::Repository(RepositoryError::NotFound) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            MessagingError::Repository(RepositoryError::Conflict(_)) => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            MessagingError::Repository(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}
