use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::firebase_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let protected_routes = Router::new()
        .merge(user_routes())
        .merge(project_routes())
        // route_layer: unmatched paths stay 404 rather than 401
        .route_layer(middleware::from_fn_with_state(state.clone(), firebase_auth_middleware));

    Router::new()
        // Public
        .route("/health", get(public::health))
        // Protected API
        .merge(protected_routes)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(protected::user_create))
        .route("/api/users/me", get(protected::user_me))
        .route("/api/users/me/credit", get(protected::user_credit))
}

fn project_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/me/projects",
            get(protected::project_list).post(protected::project_create),
        )
        .route(
            "/api/users/me/projects/:project_id",
            get(protected::project_get)
                .put(protected::project_put)
                .delete(protected::project_delete),
        )
        .route(
            "/api/users/me/projects/:project_id/compositions",
            put(protected::project_compositions),
        )
        .route("/api/users/me/projects/:project_id/name", patch(protected::project_name))
        .route(
            "/api/users/me/projects/:project_id/colorScheme",
            patch(protected::project_color_scheme),
        )
        .route("/api/users/me/projects/:project_id/chat", post(protected::project_chat))
}

/// `*` anywhere in the list means any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
