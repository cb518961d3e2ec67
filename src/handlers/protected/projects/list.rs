use axum::extract::State;

use crate::database::models::Project;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::utils::resolve_user;

/// GET /api/users/me/projects - Caller's projects, newest first
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Project>> {
    let user = resolve_user(&state, &auth).await?;

    let projects = state
        .projects()
        .list_for_owner(&user.owner_key())
        .await
        .map_err(|err| ApiError::internal(err, "Failed to retrieve projects."))?;

    Ok(ApiResponse::ok(projects))
}
