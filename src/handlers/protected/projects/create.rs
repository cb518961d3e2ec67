// handlers/protected/projects/create.rs - POST /api/users/me/projects

use axum::extract::State;

use crate::database::models::{serde_bson, CreateProjectRequest, Project};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

use super::utils::resolve_user;

/// Creates an empty draft project and links it to the caller.
///
/// The project is inserted first, then added to the user's `projects` set.
/// If linking fails the project still exists and the request reports 500.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<CreateProjectRequest>,
) -> ApiResult<Project> {
    let user = resolve_user(&state, &auth).await?;
    let projects = state.projects();

    let project_id = projects
        .create(&user.owner_key(), &body.name, serde_bson::now())
        .await
        .map_err(|err| ApiError::internal(err, "Failed to create project. Please try again later."))?;

    let created = projects
        .find(project_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to get created object."))?;

    state.users().add_project(user.id, project_id).await.map_err(|err| {
        ApiError::internal(
            err,
            "Something went wrong while creating a project. Please try again later.",
        )
    })?;

    Ok(ApiResponse::created(created))
}
