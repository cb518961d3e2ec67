use bson::{doc, oid::ObjectId, Bson};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::auth::ProviderUser;
use crate::database::collection::{DocumentStore, StoreError};
use crate::database::manager::USERS_COLLECTION;
use crate::database::models::UserProfile;
use crate::database::repository::Repository;

/// Users collection access
#[derive(Clone)]
pub struct UserService {
    users: Repository<UserProfile>,
}

impl UserService {
    pub fn new(store: &Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(store.collection(USERS_COLLECTION)),
        }
    }

    pub async fn find_by_uid(&self, uid: &str) -> Result<UserProfile, StoreError> {
        self.users.select_by("uid", uid).await
    }

    /// Inserts a new profile. The provider record is authoritative for
    /// everything except the display name.
    pub async fn create(
        &self,
        record: &ProviderUser,
        email: &str,
        display_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ObjectId, StoreError> {
        let display_name = display_name
            .filter(|name| !name.is_empty())
            .or_else(|| record.display_name.clone());

        let mut document = doc! {
            "uid": record.uid.as_str(),
            "email": email,
            "emailVerified": record.email_verified,
            "createdAt": bson::DateTime::from_chrono(now),
            "projects": Bson::Array(Vec::new()),
        };
        if let Some(name) = display_name {
            document.insert("displayName", name);
        }
        if let Some(photo_url) = record.photo_url.as_deref().and_then(parse_photo_url) {
            document.insert("photoUrl", photo_url);
        }

        let id = self.users.collection().insert_one(document).await?;
        info!("Created user {} for uid {}", id, record.uid);
        Ok(id)
    }

    /// Adds a project to the user's back-reference list (no duplicates)
    pub async fn add_project(&self, user_id: ObjectId, project_id: ObjectId) -> Result<(), StoreError> {
        let outcome = self
            .users
            .collection()
            .update_one(doc! { "_id": user_id }, doc! { "$addToSet": { "projects": project_id } })
            .await?;
        if outcome.matched == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn remove_project(&self, user_id: ObjectId, project_id: ObjectId) -> Result<(), StoreError> {
        self.users
            .collection()
            .update_one(doc! { "_id": user_id }, doc! { "$pull": { "projects": project_id } })
            .await?;
        Ok(())
    }
}

/// Keeps only absolute URLs
fn parse_photo_url(raw: &str) -> Option<String> {
    Url::parse(raw).ok().map(String::from)
}
