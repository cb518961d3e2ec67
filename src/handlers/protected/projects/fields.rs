// handlers/protected/projects/fields.rs - single-field project updates
//
// Each handler sets one field plus `metadata.updatedAt` and returns the
// re-fetched project.

use axum::extract::{Path, State};

use crate::database::models::{
    serde_bson, Project, ProjectPatch, UpdateColorSchemeRequest, UpdateCompositionsRequest,
    UpdateNameRequest,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

use super::utils::{owned_project, refetch, write_error};

async fn apply(
    state: &AppState,
    auth: &AuthUser,
    project_id: &str,
    patch: ProjectPatch,
    failure: &'static str,
) -> ApiResult<Project> {
    let (_, project) = owned_project(state, auth, project_id).await?;

    state
        .projects()
        .apply_patch(project.id, &patch)
        .await
        .map_err(|err| write_error(err, failure))?;

    Ok(ApiResponse::ok(refetch(state, project.id).await?))
}

/// PUT /api/users/me/projects/:project_id/compositions
pub async fn compositions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    JsonBody(body): JsonBody<UpdateCompositionsRequest>,
) -> ApiResult<Project> {
    let patch = ProjectPatch::touch(serde_bson::now()).compositions(body.compositions);
    apply(&state, &auth, &project_id, patch, "Failed to update project compositions.").await
}

/// PATCH /api/users/me/projects/:project_id/name
pub async fn name(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    JsonBody(body): JsonBody<UpdateNameRequest>,
) -> ApiResult<Project> {
    let patch = ProjectPatch::touch(serde_bson::now()).name(body.name);
    apply(&state, &auth, &project_id, patch, "Failed to update project name.").await
}

/// PATCH /api/users/me/projects/:project_id/colorScheme
pub async fn color_scheme(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    JsonBody(body): JsonBody<UpdateColorSchemeRequest>,
) -> ApiResult<Project> {
    let patch = ProjectPatch::touch(serde_bson::now()).color_scheme(body.color_scheme);
    apply(&state, &auth, &project_id, patch, "Failed to update project color scheme.").await
}
