use bson::{doc, oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::collection::{DocumentStore, StoreError};
use crate::database::manager::PROJECTS_COLLECTION;
use crate::database::models::{ChatMessage, Project, ProjectPatch, ProjectStatus};
use crate::database::repository::Repository;
use crate::services::UserService;

/// Which half of delete-and-detach failed
#[derive(Debug, thiserror::Error)]
pub enum RemoveError {
    #[error("failed to delete project: {0}")]
    Delete(#[source] StoreError),
    /// The project document is already gone when this is returned
    #[error("project deleted but owner reference was not removed: {0}")]
    Detach(#[source] StoreError),
}

/// Projects collection access
#[derive(Clone)]
pub struct ProjectService {
    projects: Repository<Project>,
}

impl ProjectService {
    pub fn new(store: &Arc<dyn DocumentStore>) -> Self {
        Self {
            projects: Repository::new(store.collection(PROJECTS_COLLECTION)),
        }
    }

    /// All projects of one owner, newest first
    pub async fn list_for_owner(&self, owner_key: &str) -> Result<Vec<Project>, StoreError> {
        self.projects
            .select_sorted(vec![doc! { "$match": { "userId": owner_key } }], "metadata.createdAt")
            .await
    }

    pub async fn find(&self, id: ObjectId) -> Result<Project, StoreError> {
        self.projects.select_404(doc! { "_id": id }).await
    }

    /// Inserts an empty draft and returns its id
    pub async fn create(&self, owner_key: &str, name: &str, now: DateTime<Utc>) -> Result<ObjectId, StoreError> {
        let stamp = bson::DateTime::from_chrono(now);
        let empty = || Bson::Array(Vec::new());

        let document = doc! {
            "userId": owner_key,
            "name": name,
            "metadata": {
                "createdAt": stamp,
                "updatedAt": stamp,
                "lastAccessed": stamp,
                "status": ProjectStatus::Draft.as_str(),
                "tags": empty(),
            },
            "assets": {
                "images": empty(),
                "videos": empty(),
                "audio": empty(),
                "fonts": empty(),
                "other": empty(),
            },
            "chatHistory": empty(),
            "compositions": empty(),
            "exportedVideos": empty(),
        };

        let id = self.projects.collection().insert_one(document).await?;
        info!("Created project {} for owner {}", id, owner_key);
        Ok(id)
    }

    pub async fn apply_patch(&self, id: ObjectId, patch: &ProjectPatch) -> Result<(), StoreError> {
        self.projects.update_id(&id.to_hex(), patch).await
    }

    /// Appends to `chatHistory` and refreshes `metadata.updatedAt` in one update
    pub async fn push_chat_message(&self, id: ObjectId, message: &ChatMessage) -> Result<(), StoreError> {
        let entry: Document = message.to_document()?;
        let outcome = self
            .projects
            .collection()
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$push": { "chatHistory": entry },
                    "$set": { "metadata.updatedAt": bson::DateTime::from_chrono(message.timestamp) },
                },
            )
            .await?;
        if outcome.matched == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Deletes the project, then pulls it from the owner's list. Not atomic:
    /// a detach failure leaves a dangling reference and is not rolled back.
    pub async fn remove_and_detach(
        &self,
        users: &UserService,
        owner_id: ObjectId,
        project_id: ObjectId,
    ) -> Result<(), RemoveError> {
        self.projects
            .delete_id(&project_id.to_hex())
            .await
            .map_err(RemoveError::Delete)?;

        if let Err(err) = users.remove_project(owner_id, project_id).await {
            warn!("Project {} deleted but user {} still references it", project_id, owner_id);
            return Err(RemoveError::Detach(err));
        }

        info!("Deleted project {}", project_id);
        Ok(())
    }
}
