// handlers/protected/users/create.rs - POST /api/users
//
// Registers the authenticated identity as a stored user. The identity
// provider's record is the source of truth for email, photo and
// verification; the request only contributes the display name.

use axum::extract::State;
use tracing::debug;

use crate::database::collection::StoreError;
use crate::database::models::{serde_bson, UserCreateRequest, UserCreated};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<UserCreateRequest>,
) -> ApiResult<UserCreated> {
    let users = state.users();

    match users.find_by_uid(&auth.uid).await {
        Ok(_) => {
            debug!("User for uid {} already exists", auth.uid);
            return Err(ApiError::user_exists());
        }
        Err(StoreError::NotFound) => {}
        Err(err) => {
            return Err(ApiError::internal(err, "Error while creating user. Please try again later."));
        }
    }

    let email = match auth.record.email.as_deref() {
        Some(email) if !email.is_empty() => email,
        _ => return Err(ApiError::missing_email()),
    };

    let user_id = users
        .create(&auth.record, email, body.display_name, serde_bson::now())
        .await
        .map_err(|err| match err {
            // Lost a race against a concurrent registration for the same uid
            StoreError::Duplicate(_) => ApiError::user_exists(),
            other => ApiError::internal(other, "Error while creating user. Please try again later."),
        })?;

    Ok(ApiResponse::ok(UserCreated {
        user_id: user_id.to_hex(),
    }))
}
