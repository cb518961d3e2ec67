use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::database::collection::DocumentStore;
use crate::services::{ProjectService, UserService};

/// Shared router state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub fn users(&self) -> UserService {
        UserService::new(&self.store)
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(&self.store)
    }
}
