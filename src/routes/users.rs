use std::sync::Arc;

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};

use super::{ValidJson, ValidPath, ValidQuery};
use crate::{
    AppState,
    auth::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    models::{CreateUserRequest, UpdateUserRequest, UserSearch, UserView},
    pagination::{Page, PageParams},
};

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    ValidQuery(q): ValidQuery<UserSearch>,
    ValidQuery(page): ValidQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Page<UserView>>> {
    let window = page.window(state.config.page_size);
    let (users, count) = state.store.list_users(q.search.as_deref(), window).await?;
    let users = users.into_iter().map(UserView::from).collect();
    Ok(Json(Page::new(users, count, window, &uri)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let user = state.store.create_user(req).await?;
    tracing::info!(
        username = %user.username,
        role = %user.role,
        by = %admin.username,
        "user created"
    );
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    ValidPath(username): ValidPath<String>,
) -> AppResult<Json<UserView>> {
    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    Ok(Json(user.into()))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    ValidPath(username): ValidPath<String>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> AppResult<Json<UserView>> {
    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    let user = state.store.update_user(user, req, true).await?;
    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidPath(username): ValidPath<String>,
) -> AppResult<StatusCode> {
    if !state.store.delete_user(&username).await? {
        return Err(AppError::not_found("user"));
    }
    tracing::info!(username = %username, by = %admin.username, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(AuthUser(user): AuthUser) -> Json<UserView> {
    Json(user.into())
}

/// Self-service profile edit; a submitted `role` is ignored.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> AppResult<Json<UserView>> {
    let user = state.store.update_user(user, req, false).await?;
    Ok(Json(user.into()))
}
