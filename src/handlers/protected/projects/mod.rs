pub mod chat;
pub mod create;
pub mod delete;
pub mod fields;
pub mod get;
pub mod list;
pub mod put;
pub mod utils;


// Re-export handler functions for use in routing
pub use chat::chat as project_chat;
pub use create::create as project_create;
pub use delete::delete as project_delete;
pub use fields::color_scheme as project_color_scheme;
pub use fields::compositions as project_compositions;
pub use fields::name as project_name;
pub use get::get as project_get;
pub use list::list as project_list;
pub use put::put as project_put;
