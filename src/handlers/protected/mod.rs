// handlers/protected/mod.rs - Handlers behind the bearer-token middleware
//
// Route Prefix: /api/users/*
// Middleware: firebase_auth_middleware, which attaches `AuthUser`

pub mod projects;
pub mod users;

pub use projects::{
    project_chat, project_color_scheme, project_compositions, project_create, project_delete,
    project_get, project_list, project_name, project_put,
};
pub use users::{user_create, user_credit, user_me};
