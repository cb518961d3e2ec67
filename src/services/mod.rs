pub mod project_service;
pub mod user_service;

pub use project_service::{ProjectService, RemoveError};
pub use user_service::UserService;
