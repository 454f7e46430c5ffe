use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use super::domain::{TaskId, TodoCategoryId};
use super::repository::TodoRepository;
use super::service::{TaskForm, TaskQuery, TodoCategoryForm, TodoError, TodoService};
use crate::accounts::{AccountRepository, Actor};
use crate::http::{JsonBody, error_response, flash, validation_response};
use crate::store::RepositoryError;

/// The caller's own tasks and task categories.
pub fn todo_router<S>(service: Arc<TodoService<S>>) -> Router
where
    S: AccountRepository + TodoRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/todo/tasks",
            get(board_handler::<S>).post(create_task_handler::<S>),
        )
        .route(
            "/api/v1/todo/tasks/:task_id",
            put(update_task_handler::<S>).delete(delete_task_handler::<S>),
        )
        .route(
            "/api/v1/todo/tasks/:task_id/toggle",
            post(toggle_task_handler::<S>),
        )
        .route(
            "/api/v1/todo/categories",
            get(categories_handler::<S>).post(create_category_handler::<S>),
        )
        .route(
            "/api/v1/todo/categories/:category_id",
            put(update_category_handler::<S>).delete(delete_category_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn board_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    Query(query): Query<TaskQuery>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.board(actor, query) {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_task_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    JsonBody(form): JsonBody<TaskForm>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.create_task(actor, form) {
        Ok(task) => flash(StatusCode::CREATED, "task", &task, "Task created successfully!"),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_task_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    Path(task_id): Path<u64>,
    JsonBody(form): JsonBody<TaskForm>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.update_task(actor, TaskId(task_id), form) {
        Ok(task) => flash(StatusCode::OK, "task", &task, "Task updated successfully!"),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn toggle_task_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    Path(task_id): Path<u64>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.toggle_task(actor, TaskId(task_id)) {
        Ok(task) => {
            let status = if task.completed { "completed" } else { "reopened" };
            flash(StatusCode::OK, "task", &task, format!("Task {status}!"))
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_task_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    Path(task_id): Path<u64>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.delete_task(actor, TaskId(task_id)) {
        Ok(task) => flash(
            StatusCode::OK,
            "deleted",
            &task.id,
            "Task deleted successfully!",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn categories_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.list_categories(actor) {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_category_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    JsonBody(form): JsonBody<TodoCategoryForm>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.create_category(actor, form) {
        Ok(category) => flash(
            StatusCode::CREATED,
            "category",
            &category,
            "Category created successfully!",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_category_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    Path(category_id): Path<u64>,
    JsonBody(form): JsonBody<TodoCategoryForm>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.update_category(actor, TodoCategoryId(category_id), form) {
        Ok(category) => flash(
            StatusCode::OK,
            "category",
            &category,
            "Category updated successfully!",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_category_handler<S>(
    State(service): State<Arc<TodoService<S>>>,
    Actor(actor): Actor,
    Path(category_id): Path<u64>,
) -> Response
where
    S: AccountRepository + TodoRepository + 'static,
{
    match service.delete_category(actor, TodoCategoryId(category_id)) {
        Ok(category) => flash(
            StatusCode::OK,
            "deleted",
            &category.id,
            "Category deleted successfully!",
        ),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        match self {
            TodoError::Access(error) => error.into_response(),
            TodoError::Validation(errors) => validation_response(&errors),
            TodoError::TaskNotFound(_)
            | TodoError::CategoryNotFound(_)
            | TodoError::Repository(RepositoryError::NotFound) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            TodoError::CategoryInUse { .. }
            | TodoError::Repository(RepositoryError::Conflict(_)) => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            TodoError::Repository(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}
