use bson::oid::ObjectId;
use tracing::warn;

use crate::database::collection::StoreError;
use crate::database::models::{Project, UserProfile};
use crate::database::repository::parse_object_id;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Malformed identifiers are rejected before the store is touched
pub fn parse_project_id(raw: &str) -> Result<ObjectId, ApiError> {
    parse_object_id(raw).map_err(|_| ApiError::invalid_project_id())
}

/// Stored profile of the authenticated caller
pub async fn resolve_user(state: &AppState, auth: &AuthUser) -> Result<UserProfile, ApiError> {
    state.users().find_by_uid(&auth.uid).await.map_err(|err| match err {
        StoreError::NotFound => ApiError::user_not_found(),
        other => ApiError::internal(other, "Failed to get user information."),
    })
}

/// Loads a project and checks it belongs to `user`. A foreign project is
/// indistinguishable from a missing one.
pub async fn load_owned_project(
    state: &AppState,
    user: &UserProfile,
    project_id: ObjectId,
) -> Result<Project, ApiError> {
    let project = state.projects().find(project_id).await.map_err(|err| match err {
        StoreError::NotFound => ApiError::project_not_found(),
        other => ApiError::internal(other, "Failed to retrieve project."),
    })?;

    if !project.is_owned_by(&user.owner_key()) {
        warn!("User {} requested project {} owned by {}", user.id, project_id, project.user_id);
        return Err(ApiError::project_not_found());
    }
    Ok(project)
}

/// Parse, resolve the caller, then load the project
pub async fn owned_project(
    state: &AppState,
    auth: &AuthUser,
    raw_id: &str,
) -> Result<(UserProfile, Project), ApiError> {
    let project_id = parse_project_id(raw_id)?;
    let user = resolve_user(state, auth).await?;
    let project = load_owned_project(state, &user, project_id).await?;
    Ok((user, project))
}

/// Client data BSON cannot represent (such as integers above `i64::MAX`)
/// is a bad request; anything else is a store failure
pub fn write_error(err: StoreError, failure: &'static str) -> ApiError {
    match err {
        StoreError::Encode(cause) => ApiError::bad_request("Invalid request body", cause.to_string()),
        other => ApiError::internal(other, failure),
    }
}

/// Fresh copy after a mutation
pub async fn refetch(state: &AppState, project_id: ObjectId) -> Result<Project, ApiError> {
    state
        .projects()
        .find(project_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to retrieve updated project."))
}
