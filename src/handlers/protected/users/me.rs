use axum::extract::State;
use serde_json::{json, Value};

use crate::database::collection::StoreError;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/users/me - Stored profile of the caller
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<UserProfile> {
    let user = state.users().find_by_uid(&auth.uid).await.map_err(|err| match err {
        StoreError::NotFound => ApiError::user_not_found(),
        other => ApiError::internal(other, "An error occurred while retrieving the user profile."),
    })?;

    Ok(ApiResponse::ok(user))
}

/// GET /api/users/me/credit - Placeholder until billing exists; always `{}`
pub async fn credit(_auth: AuthUser) -> ApiResult<Value> {
    Ok(ApiResponse::ok(json!({})))
}
