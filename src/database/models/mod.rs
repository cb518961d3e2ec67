pub mod project;
pub mod serde_bson;
pub mod user;

pub use project::{
    Asset, ChatMessage, ChatMessageRequest, ChatRole, ColorPalette, Composition,
    CreateProjectRequest, ExportedVideo, Project, ProjectAssets, ProjectMetadata, ProjectPatch,
    ProjectStatus, UpdateColorSchemeRequest, UpdateCompositionsRequest, UpdateNameRequest,
    UpdateProjectRequest,
};
pub use user::{UserCreateRequest, UserCreated, UserProfile};
