use std::sync::Arc;

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};

use super::{ValidJson, ValidPath, ValidQuery};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{SearchQuery, SlugEntry, SlugEntryRequest},
    pagination::{Page, PageParams},
};

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<SearchQuery>,
    ValidQuery(page): ValidQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Page<SlugEntry>>> {
    let window = page.window(state.config.page_size);
    let (rows, count) = state.store.list_categories(q.search.as_deref(), window).await?;
    Ok(Json(Page::new(rows, count, window, &uri)))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<SlugEntryRequest>,
) -> AppResult<(StatusCode, Json<SlugEntry>)> {
    let entry = state.store.create_category(req).await?;
    tracing::info!(slug = %entry.slug, by = %admin.username, "category created");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidPath(slug): ValidPath<String>,
) -> AppResult<StatusCode> {
    if !state.store.delete_category(&slug).await? {
        return Err(AppError::not_found("category"));
    }
    tracing::info!(slug = %slug, by = %admin.username, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<SearchQuery>,
    ValidQuery(page): ValidQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Page<SlugEntry>>> {
    let window = page.window(state.config.page_size);
    let (rows, count) = state.store.list_genres(q.search.as_deref(), window).await?;
    Ok(Json(Page::new(rows, count, window, &uri)))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<SlugEntryRequest>,
) -> AppResult<(StatusCode, Json<SlugEntry>)> {
    let entry = state.store.create_genre(req).await?;
    tracing::info!(slug = %entry.slug, by = %admin.username, "genre created");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidPath(slug): ValidPath<String>,
) -> AppResult<StatusCode> {
    if !state.store.delete_genre(&slug).await? {
        return Err(AppError::not_found("genre"));
    }
    tracing::info!(slug = %slug, by = %admin.username, "genre deleted");
    Ok(StatusCode::NO_CONTENT)
}
