use axum::extract::{Path, State};

use crate::database::models::{serde_bson, Project, ProjectPatch, UpdateProjectRequest};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

use super::utils::{owned_project, refetch, write_error};

/// PUT /api/users/me/projects/:project_id - Replace any of name, compositions, colorScheme
pub async fn put(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    JsonBody(body): JsonBody<UpdateProjectRequest>,
) -> ApiResult<Project> {
    let (_, project) = owned_project(&state, &auth, &project_id).await?;

    let mut patch = ProjectPatch::touch(serde_bson::now());
    if let Some(name) = body.name {
        patch = patch.name(name);
    }
    if let Some(compositions) = body.compositions {
        patch = patch.compositions(compositions);
    }
    if let Some(palette) = body.color_scheme {
        patch = patch.color_scheme(palette);
    }

    state
        .projects()
        .apply_patch(project.id, &patch)
        .await
        .map_err(|err| write_error(err, "Failed to update project."))?;

    Ok(ApiResponse::ok(refetch(&state, project.id).await?))
}
