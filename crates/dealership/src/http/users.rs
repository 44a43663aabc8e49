use axum::extract::State;
use tracing::info;

use super::response::{ApiResponse, Empty, JsonBody, PathId};
use super::{blocking, AppState};
use crate::auth::{hash_password, AuthUser};
use crate::error::{Error, Result};
use crate::model::{ProfileInput, Role, User, UserInput, UserPatch};

/// `GET /api/users`
pub(super) async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<ApiResponse<Vec<User>>> {
    caller.authorize(&[Role::Admin])?;
    let users = state.storage()?.list_users()?;
    Ok(ApiResponse::list(users))
}

/// `POST /api/users`
pub(super) async fn create_user(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<ApiResponse<User>> {
    caller.authorize(&[Role::Admin])?;
    let new_user = input.into_new()?;
    let existing = state.storage()?.find_user_by_email(&new_user.email)?;
    if existing.is_some() {
        return Err(Error::DuplicateEmail);
    }

    let password = new_user.password.clone();
    let hash = blocking(move || hash_password(&password)).await?;
    let user = state.storage()?.create_user(&new_user, &hash)?;
    info!(user_id = user.id, role = %user.role, by = caller.id(), "User created");
    Ok(ApiResponse::created(user))
}

/// `GET /api/users/{id}`
pub(super) async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<User>> {
    caller.authorize(&[Role::Admin])?;
    let user = state.storage()?.get_user(id)?;
    user.map(ApiResponse::ok).ok_or(Error::NotFound("User"))
}

/// `PUT /api/users/{id}`
pub(super) async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<ApiResponse<User>> {
    caller.authorize(&[Role::Admin])?;
    let patch = input.into_patch()?;
    let user = apply_patch(&state, id, patch).await?;
    user.map(ApiResponse::ok).ok_or(Error::NotFound("User"))
}

/// `DELETE /api/users/{id}`
pub(super) async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<Empty>> {
    caller.authorize(&[Role::Admin])?;
    let deleted = state.storage()?.delete_user(id)?;
    if !deleted {
        return Err(Error::NotFound("User"));
    }
    info!(user_id = id, by = caller.id(), "User deleted");
    Ok(ApiResponse::ok(Empty {}))
}

/// `PUT /api/users/profile`
pub(super) async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<ProfileInput>,
) -> Result<ApiResponse<User>> {
    let patch = input.into_patch()?;
    let user = apply_patch(&state, caller.id(), patch).await?;
    user.map(ApiResponse::ok).ok_or(Error::NotFound("User"))
}

async fn apply_patch(state: &AppState, id: i64, patch: UserPatch) -> Result<Option<User>> {
    let hash = match patch.password.clone() {
        Some(password) => Some(blocking(move || hash_password(&password)).await?),
        None => None,
    };
    let user = state.storage()?.update_user(id, &patch, hash.as_deref())?;
    Ok(user)
}
