use axum::extract::{Path, State};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::RemoveError;
use crate::state::AppState;

use super::utils::owned_project;

/// DELETE /api/users/me/projects/:project_id
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<()> {
    let (user, project) = owned_project(&state, &auth, &project_id).await?;

    state
        .projects()
        .remove_and_detach(&state.users(), user.id, project.id)
        .await
        .map_err(|err| match err {
            RemoveError::Delete(cause) => ApiError::internal(cause, "Failed to delete project."),
            RemoveError::Detach(cause) => ApiError::internal(
                cause,
                "Project was deleted but failed to update user references.",
            ),
        })?;

    Ok(ApiResponse::no_content())
}
