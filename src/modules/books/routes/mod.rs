//! HTTP handlers for the books module.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shelf_http::error::AppError;

use super::discovery::{self, DiscoveryParams, DiscoveryQuery};
use super::models::{Book, BookPatch, NewBook};
use super::recommend::{self, Recommendation};
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "books module is healthy"
}

/// List the catalog through the discovery pipeline
pub async fn list_books(
    State(state): State<AppState>,
    params: Result<Query<DiscoveryParams>, QueryRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Query(params) = params.map_err(|err| AppError::bad_request(err.body_text()))?;
    let query = DiscoveryQuery::from(params);

    let catalog = state.catalog.list().await;
    let statuses = state.status.snapshot().await;
    let books = discovery::discover(&catalog, &query, &statuses);

    tracing::debug!(
        term = %query.term,
        total = catalog.len(),
        shown = books.len(),
        "catalog discovered"
    );
    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.catalog.get(&id).await?))
}

pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(input) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;
    let book = state.catalog.create(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Partial update; a status change invalidates the tracker entry for the book
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Json(patch) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;
    let touches_status = patch.status.is_some();

    let book = state.catalog.update(&id, patch).await?;
    if touches_status {
        state.status.invalidate(&book.id).await;
    }
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = state.catalog.delete(&id).await?;
    state.status.invalidate(&book.id).await;
    Ok(Json(book))
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    #[serde(default)]
    pub k: Option<usize>,
}

/// Related books for one title
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<RecommendParams>, QueryRejection>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let Query(params) = params.map_err(|err| AppError::bad_request(err.body_text()))?;
    let focal = state.catalog.get(&id).await?;
    let catalog = state.catalog.list().await;

    let k = params.k.unwrap_or(state.recommend_k);
    let recs = recommend::recommend(&catalog, &focal, k);

    tracing::debug!(book_id = %focal.id, k, found = recs.len(), "recommendations computed");
    Ok(Json(recs))
}
