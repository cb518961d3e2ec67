use axum::extract::{Path, State};

use crate::database::models::Project;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::utils::owned_project;

/// GET /api/users/me/projects/:project_id
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<Project> {
    let (_, project) = owned_project(&state, &auth, &project_id).await?;
    Ok(ApiResponse::ok(project))
}
