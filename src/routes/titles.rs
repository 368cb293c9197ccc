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
    models::{CreateTitleRequest, TitleFilter, TitleView, UpdateTitleRequest},
    pagination::{Page, PageParams},
};

pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<TitleFilter>,
    ValidQuery(page): ValidQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Page<TitleView>>> {
    let window = page.window(state.config.page_size);
    let (rows, count) = state.store.list_titles(&filter, window).await?;
    Ok(Json(Page::new(rows, count, window, &uri)))
}

pub async fn get_title(
    State(state): State<Arc<AppState>>,
    ValidPath(title_id): ValidPath<i32>,
) -> AppResult<Json<TitleView>> {
    let title =
        state.store.find_title(title_id).await?.ok_or_else(|| AppError::not_found("title"))?;
    Ok(Json(state.store.title_view(title).await?))
}

pub async fn create_title(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    ValidJson(req): ValidJson<CreateTitleRequest>,
) -> AppResult<(StatusCode, Json<TitleView>)> {
    let view = state.store.create_title(req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_title(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    ValidPath(title_id): ValidPath<i32>,
    ValidJson(req): ValidJson<UpdateTitleRequest>,
) -> AppResult<Json<TitleView>> {
    let title =
        state.store.find_title(title_id).await?.ok_or_else(|| AppError::not_found("title"))?;
    Ok(Json(state.store.update_title(title, req).await?))
}

pub async fn delete_title(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidPath(title_id): ValidPath<i32>,
) -> AppResult<StatusCode> {
    if !state.store.delete_title(title_id).await? {
        return Err(AppError::not_found("title"));
    }
    tracing::info!(title_id, by = %admin.username, "title deleted with its reviews");
    Ok(StatusCode::NO_CONTENT)
}
