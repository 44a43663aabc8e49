use axum::extract::State;
use tracing::info;

use super::response::{ApiResponse, JsonBody};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::Result;
use crate::model::{Feedback, FeedbackInput, Role};

/// `POST /api/feedback`, open to anyone.
pub(super) async fn create_feedback(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<FeedbackInput>,
) -> Result<ApiResponse<Feedback>> {
    let new_feedback = input.validate()?;
    let feedback = state.storage()?.insert_feedback(&new_feedback)?;
    info!(feedback_id = feedback.id, "Feedback received");
    Ok(ApiResponse::created(feedback))
}

/// `GET /api/feedback/admin`
pub(super) async fn list_feedback(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<ApiResponse<Vec<Feedback>>> {
    caller.authorize(&[Role::Admin])?;
    let feedback = state.storage()?.list_feedback()?;
    Ok(ApiResponse::list(feedback))
}
