use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_bson::{datetime, object_id_hex, object_ids_hex};

/// A stored user, keyed by the identity provider's `uid`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename(deserialize = "_id", serialize = "id"), serialize_with = "object_id_hex")]
    pub id: ObjectId,
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(with = "datetime")]
    pub created_at: DateTime<Utc>,
    /// Denormalized list of owned project ids; ownership itself lives on the project
    #[serde(default, serialize_with = "object_ids_hex")]
    pub projects: Vec<ObjectId>,
}

impl UserProfile {
    /// The form stored in `projects.userId`
    pub fn owner_key(&self) -> String {
        self.id.to_hex()
    }
}

/// Caller-supplied profile fields. The email is overwritten by the identity provider's.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub user_id: String,
}
