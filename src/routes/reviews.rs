use std::sync::Arc;

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};

use super::{ValidJson, ValidPath, ValidQuery};
use crate::{
    AppState,
    auth::AuthUser,
    entities::review,
    error::{AppError, AppResult},
    models::{
        CommentRequest, CommentView, CreateReviewRequest, ReviewView, UpdateCommentRequest,
        UpdateReviewRequest,
    },
    pagination::{Page, PageParams},
    permissions::require_content_access,
};

async fn ensure_title(state: &AppState, title_id: i32) -> AppResult<()> {
    match state.store.find_title(title_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("title")),
    }
}

/// Resolves the review through its title so mismatched ids are a 404.
async fn load_review(state: &AppState, title_id: i32, review_id: i32) -> AppResult<review::Model> {
    ensure_title(state, title_id).await?;
    state.store.find_review(title_id, review_id).await?.ok_or_else(|| AppError::not_found("review"))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    ValidPath(title_id): ValidPath<i32>,
    ValidQuery(page): ValidQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Page<ReviewView>>> {
    ensure_title(&state, title_id).await?;
    let window = page.window(state.config.page_size);
    let (rows, count) = state.store.list_reviews(title_id, window).await?;
    Ok(Json(Page::new(rows, count, window, &uri)))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidPath(title_id): ValidPath<i32>,
    ValidJson(req): ValidJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewView>)> {
    ensure_title(&state, title_id).await?;
    let view = state.store.create_review(title_id, &user, req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_review(
    State(state): State<Arc<AppState>>,
    ValidPath((title_id, review_id)): ValidPath<(i32, i32)>,
) -> AppResult<Json<ReviewView>> {
    let review = load_review(&state, title_id, review_id).await?;
    Ok(Json(state.store.review_view(review).await?))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidPath((title_id, review_id)): ValidPath<(i32, i32)>,
    ValidJson(req): ValidJson<UpdateReviewRequest>,
) -> AppResult<Json<ReviewView>> {
    let review = load_review(&state, title_id, review_id).await?;
    require_content_access(&user, review.author_id)?;
    Ok(Json(state.store.update_review(review, req).await?))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidPath((title_id, review_id)): ValidPath<(i32, i32)>,
) -> AppResult<StatusCode> {
    let review = load_review(&state, title_id, review_id).await?;
    require_content_access(&user, review.author_id)?;
    state.store.delete_review(review).await?;
    tracing::info!(review_id, by = %user.username, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    ValidPath((title_id, review_id)): ValidPath<(i32, i32)>,
    ValidQuery(page): ValidQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Page<CommentView>>> {
    load_review(&state, title_id, review_id).await?;
    let window = page.window(state.config.page_size);
    let (rows, count) = state.store.list_comments(review_id, window).await?;
    Ok(Json(Page::new(rows, count, window, &uri)))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidPath((title_id, review_id)): ValidPath<(i32, i32)>,
    ValidJson(req): ValidJson<CommentRequest>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    load_review(&state, title_id, review_id).await?;
    let view = state.store.create_comment(review_id, &user, req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    ValidPath((title_id, review_id, comment_id)): ValidPath<(i32, i32, i32)>,
) -> AppResult<Json<CommentView>> {
    load_review(&state, title_id, review_id).await?;
    let comment = state
        .store
        .find_comment(review_id, comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("comment"))?;
    Ok(Json(state.store.comment_view(comment).await?))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidPath((title_id, review_id, comment_id)): ValidPath<(i32, i32, i32)>,
    ValidJson(req): ValidJson<UpdateCommentRequest>,
) -> AppResult<Json<CommentView>> {
    load_review(&state, title_id, review_id).await?;
    let comment = state
        .store
        .find_comment(review_id, comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("comment"))?;
    require_content_access(&user, comment.author_id)?;
    Ok(Json(state.store.update_comment(comment, req).await?))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidPath((title_id, review_id, comment_id)): ValidPath<(i32, i32, i32)>,
) -> AppResult<StatusCode> {
    load_review(&state, title_id, review_id).await?;
    let comment = state
        .store
        .find_comment(review_id, comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("comment"))?;
    require_content_access(&user, comment.author_id)?;
    state.store.delete_comment(comment).await?;
    Ok(StatusCode::NO_CONTENT)
}
