//! Bearer-token authentication and confirmation codes.
//!
//! Access tokens are HS256 JWTs carrying the user id. Confirmation codes are
//! random strings stored on the user row and cleared once exchanged.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    entities::user,
    error::{AppError, AppResult},
    permissions,
};

const CONFIRMATION_CODE_LEN: usize = 32;
const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: ttl_hours * 3_600,
        }
    }

    pub fn issue(&self, user: &user::Model) -> AppResult<String> {
        let now = jiff::Timestamp::now().as_second();
        let claims = Claims {
            user_id: user.id,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("signing access token")))
    }

    pub fn verify(&self, token: &str) -> Option<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).ok()?;
        (data.claims.token_type == ACCESS_TOKEN_TYPE).then_some(data.claims)
    }
}

pub fn generate_confirmation_code() -> String {
    rand::rng().sample_iter(&Alphanumeric).take(CONFIRMATION_CODE_LEN).map(char::from).collect()
}

/// Constant-time with respect to the code contents; an empty stored code never matches.
pub fn confirmation_code_matches(stored: &str, given: &str) -> bool {
    if stored.is_empty() || stored.len() != given.len() {
        return false;
    }
    stored.bytes().zip(given.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// An authenticated caller. Rejects with 401 when the token is missing or invalid.
#[derive(Clone, Debug)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = state.tokens.verify(token).ok_or(AppError::Unauthorized)?;
        let user =
            state.store.find_user_by_id(claims.user_id).await?.ok_or(AppError::Unauthorized)?;
        Ok(AuthUser(user))
    }
}

/// An authenticated admin; non-admins are rejected with 403 before the body is read.
#[derive(Clone, Debug)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) =
            <AuthUser as FromRequestParts<Arc<AppState>>>::from_request_parts(parts, state).await?;
        permissions::require_admin(&user)?;
        Ok(AdminUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
