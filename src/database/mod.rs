pub mod collection;
pub mod manager;
pub mod models;
pub mod repository;

pub use collection::{DocumentCollection, DocumentStore, StoreError, UpdateOutcome};
pub use manager::{DatabaseManager, PROJECTS_COLLECTION, USERS_COLLECTION};
pub use repository::{parse_object_id, ListOrder, Repository};
