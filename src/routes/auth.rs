use std::sync::Arc;

use axum::{Json, extract::State};

use super::ValidJson;
use crate::{
    AppState,
    auth::{confirmation_code_matches, generate_confirmation_code},
    error::{AppError, AppResult},
    mail::Email,
    models::{SignupRequest, TokenRequest, TokenResponse},
    store::SignupOutcome,
};

/// Registers the account (or finds the matching one) and mails a fresh code.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<SignupRequest>,
) -> AppResult<Json<SignupRequest>> {
    let outcome = state.store.signup_user(&req).await?;
    let created = matches!(outcome, SignupOutcome::Created(_));
    let code = generate_confirmation_code();
    let user = state.store.set_confirmation_code(outcome.into_user(), &code).await?;

    state
        .mailer
        .send(Email::confirmation_code(&state.config.email_from, &user.email, &code))
        .await?;

    tracing::info!(username = %user.username, created, "confirmation code sent");
    Ok(Json(req))
}

pub async fn token(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = state
        .store
        .find_user_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    if !confirmation_code_matches(&user.confirmation_code, &req.confirmation_code) {
        tracing::debug!(username = %user.username, "confirmation code mismatch");
        return Err(AppError::field("confirmation_code", "Invalid confirmation code."));
    }

    let user = state.store.set_confirmation_code(user, "").await?;
    let token = state.tokens.issue(&user)?;
    tracing::info!(username = %user.username, "access token issued");
    Ok(Json(TokenResponse { token }))
}
