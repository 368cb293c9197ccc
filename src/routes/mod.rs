mod auth;
mod catalog;
mod reviews;
mod titles;
mod users;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::PathRejection},
    http::request::Parts,
    routing::{delete, get, post},
};
use serde::de::DeserializeOwned;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{AppState, error::AppError};

pub fn app(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/token/", post(auth::token))
        .route("/categories/", get(catalog::list_categories).post(catalog::create_category))
        .route("/categories/{slug}/", delete(catalog::delete_category))
        .route("/genres/", get(catalog::list_genres).post(catalog::create_genre))
        .route("/genres/{slug}/", delete(catalog::delete_genre))
        .route("/titles/", get(titles::list_titles).post(titles::create_title))
        .route(
            "/titles/{title_id}/",
            get(titles::get_title).patch(titles::update_title).delete(titles::delete_title),
        )
        .route(
            "/titles/{title_id}/reviews/",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(reviews::get_review).patch(reviews::update_review).delete(reviews::delete_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(reviews::list_comments).post(reviews::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(reviews::get_comment)
                .patch(reviews::update_comment)
                .delete(reviews::delete_comment),
        )
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/me/", get(users::me).patch(users::update_me))
        .route(
            "/users/{username}/",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        );

    Router::new().nest("/v1", v1).with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any)),
    )
}

/// JSON body that has passed its `Validate` rules. Malformed JSON is a 400
/// with `detail`, rule violations a 400 keyed by field.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string parameters. A string that does not deserialize is a 400 with `detail`.
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path segments. A segment of the wrong shape (say `/titles/abc/`) names no
/// resource, so it is a 404.
pub struct ValidPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => {
                tracing::debug!(
                    path = %parts.uri.path(),
                    error = %err.body_text(),
                    "unmatched path"
                );
                Err(AppError::not_found("resource"))
            },
            Err(rejection) => Err(anyhow::anyhow!(rejection.body_text()).into()),
        }
    }
}
