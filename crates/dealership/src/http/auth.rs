use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use super::response::{ApiResponse, JsonBody, TokenResponse};
use super::{blocking, AppState};
use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{Error, Result};
use crate::model::{LoginInput, RegisterInput, User};

/// `POST /api/auth/register`
pub(super) async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> Result<TokenResponse> {
    let new_user = input.validate()?;
    let existing = state.storage()?.find_user_by_email(&new_user.email)?;
    if existing.is_some() {
        return Err(Error::DuplicateEmail);
    }

    let password = new_user.password.clone();
    let hash = blocking(move || hash_password(&password)).await?;
    let user = state.storage()?.create_user(&new_user, &hash)?;
    info!(user_id = user.id, "Registered new customer");

    let token = state.tokens.sign(user.id)?;
    Ok(TokenResponse::new(StatusCode::CREATED, token, user.role))
}

/// `POST /api/auth/login`
pub(super) async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> Result<TokenResponse> {
    let (email, password) = input.validate()?;
    let credentials = state.storage()?.find_user_by_email(&email)?;
    let Some(credentials) = credentials else {
        return Err(invalid_credentials());
    };

    let hash = credentials.password_hash;
    if !blocking(move || verify_password(&password, &hash)).await? {
        return Err(invalid_credentials());
    }

    let token = state.tokens.sign(credentials.user.id)?;
    Ok(TokenResponse::new(
        StatusCode::OK,
        token,
        credentials.user.role,
    ))
}

/// `GET /api/auth/me`
pub(super) async fn me(AuthUser(user): AuthUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}

fn invalid_credentials() -> Error {
    Error::Unauthorized("Invalid credentials".to_string())
}
