use axum::extract::{Path, State};

use crate::database::models::{serde_bson, ChatMessage, ChatMessageRequest};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

use super::utils::{owned_project, write_error};

/// POST /api/users/me/projects/:project_id/chat - Append to chat history.
/// Responds with the stored message only.
pub async fn chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    JsonBody(body): JsonBody<ChatMessageRequest>,
) -> ApiResult<ChatMessage> {
    let (_, project) = owned_project(&state, &auth, &project_id).await?;

    let message = ChatMessage::new(body.role, body.content, body.metadata, serde_bson::now());
    state
        .projects()
        .push_chat_message(project.id, &message)
        .await
        .map_err(|err| write_error(err, "Failed to add message to chat history."))?;

    Ok(ApiResponse::ok(message))
}
