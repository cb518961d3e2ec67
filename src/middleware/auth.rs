use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::ProviderUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, attached to the request by `firebase_auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub uid: String,
    pub record: ProviderUser,
}

impl From<ProviderUser> for AuthUser {
    fn from(record: ProviderUser) -> Self {
        Self {
            uid: record.uid.clone(),
            record,
        }
    }
}

/// Handlers take `AuthUser` as an argument; a route mounted outside the
/// middleware gets a 401 instead of a missing identity.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("No authenticated user on request"))
    }
}

/// Verifies the bearer token and injects `AuthUser` into request extensions
pub async fn firebase_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(|msg| {
        debug!("Rejected request to {}: {}", request.uri().path(), msg);
        ApiError::unauthorized(msg)
    })?;

    let record = state.identity.verify_token(&token).await.map_err(|err| {
        warn!("Token verification failed: {}", err);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(AuthUser::from(record));
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty bearer token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
