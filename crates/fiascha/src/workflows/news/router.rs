use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use super::domain::{ArticleId, CategoryId};
use super::repository::NewsRepository;
use super::service::{ArticleForm, CategoryForm, ListParams, NewsError, NewsService, SearchParams};
use crate::accounts::{AccountRepository, Actor};
use crate::http::{JsonBody, error_response, flash, validation_response};
use crate::store::RepositoryError;

/// Public reading endpoints plus the newsroom and category management.
pub fn news_router<S>(service: Arc<NewsService<S>>) -> Router
where
    S: AccountRepository + NewsRepository + 'static,
{
    Router::new()
        .route("/api/v1/news", get(list_handler::<S>))
        .route("/api/v1/news/search", get(search_handler::<S>))
        .route("/api/v1/news/articles", post(create_article_handler::<S>))
        .route("/api/v1/news/articles/:slug", get(read_handler::<S>))
        .route(
            "/api/v1/news/articles/by-id/:article_id",
            put(update_article_handler::<S>).delete(delete_article_handler::<S>),
        )
        .route(
            "/api/v1/news/categories",
            get(categories_handler::<S>).post(create_category_handler::<S>),
        )
        .route(
            "/api/v1/news/categories/:category_id",
            put(update_category_handler::<S>).delete(delete_category_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.list(params) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn search_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.search(params) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn read_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
    reader: Option<Actor>,
    Path(slug): Path<String>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.read(reader.map(|Actor(id)| id), &slug) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_article_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
    Actor(actor): Actor,
    JsonBody(form): JsonBody<ArticleForm>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.create_article(actor, form) {
        Ok(article) => flash(
            StatusCode::CREATED,
            "article",
            &article,
            "Article created successfully!",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_article_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
    Actor(actor): Actor,
    Path(article_id): Path<u64>,
    JsonBody(form): JsonBody<ArticleForm>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.update_article(actor, ArticleId(article_id), form) {
        Ok(article) => flash(
            StatusCode::OK,
            "article",
            &article,
            "Article updated successfully!",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_article_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
    Actor(actor): Actor,
    Path(article_id): Path<u64>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.delete_article(actor, ArticleId(article_id)) {
        Ok(article) => flash(
            StatusCode::OK,
            "deleted",
            &article.id,
            "Article deleted successfully.",
        ),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn categories_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.categories() {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_category_handler<S>(
    State(service): State<Arc<NewsService<S>>>,
    Actor(actor): Actor,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
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
    State(service): State<Arc<NewsService<S>>>,
    Actor(actor): Actor,
    Path(category_id): Path<u64>,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.update_category(actor, CategoryId(category_id), form) {
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
    State(service): State<Arc<NewsService<S>>>,
    Actor(actor): Actor,
    Path(category_id): Path<u64>,
) -> Response
where
    S: AccountRepository + NewsRepository + 'static,
{
    match service.delete_category(actor, CategoryId(category_id)) {
        Ok(category) => flash(
            StatusCode::OK,
            "deleted",
            &category.id,
            "Category deleted successfully.",
        ),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for NewsError {
    fn into_response(self) -> Response {
        match self {
            NewsError::Access(error) => error.into_response(),
            NewsError::Validation(errors) => validation_response(&errors),
            NewsError::ArticleNotFound(_)
            | NewsError::CategoryNotFound(_)
            | NewsError::Repository(RepositoryError::NotFound) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            NewsError::CategoryInUse(_) | NewsError::Repository(RepositoryError::Conflict(_)) => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            NewsError::Repository(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}
