use bson::{doc, oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::serde_bson::{datetime, object_id_hex};

/// Opaque composition document authored by the editor
pub type Composition = Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(with = "datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "datetime")]
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssets {
    #[serde(default)]
    pub images: Vec<Asset>,
    #[serde(default)]
    pub videos: Vec<Asset>,
    #[serde(default)]
    pub audio: Vec<Asset>,
    #[serde(default)]
    pub fonts: Vec<Asset>,
    #[serde(default)]
    pub other: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedVideo {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub id: String,
    pub name: String,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Agent => "agent",
        }
    }
}

/// One entry of a project's append-only chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: String, metadata: Option<Value>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new().to_hex(),
            role,
            content,
            timestamp,
            metadata,
        }
    }

    /// Storage form: the timestamp must land as a BSON datetime
    pub fn to_document(&self) -> Result<Document, bson::ser::Error> {
        let metadata = match &self.metadata {
            Some(value) => bson::to_bson(value)?,
            None => Bson::Null,
        };
        Ok(doc! {
            "id": self.id.as_str(),
            "role": self.role.as_str(),
            "content": self.content.as_str(),
            "timestamp": bson::DateTime::from_chrono(self.timestamp),
            "metadata": metadata,
        })
    }
}

/// A stored project. List fields absent from the document decode as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename(deserialize = "_id", serialize = "id"), serialize_with = "object_id_hex")]
    pub id: ObjectId,
    pub user_id: String,
    pub name: String,
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub assets: ProjectAssets,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub compositions: Vec<Composition>,
    #[serde(default)]
    pub exported_videos: Vec<ExportedVideo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<ColorPalette>,
}

impl Project {
    pub fn is_owned_by(&self, owner_key: &str) -> bool {
        self.user_id == owner_key
    }
}

/// Field-level `$set` for a project. Unset options leave the stored field alone;
/// `metadata.updatedAt` is always refreshed.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compositions: Option<Vec<Composition>>,
    #[serde(rename = "colorScheme", skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<ColorPalette>,
    #[serde(rename = "metadata.updatedAt")]
    pub updated_at: bson::DateTime,
}

impl ProjectPatch {
    pub fn touch(now: DateTime<Utc>) -> Self {
        Self {
            name: None,
            compositions: None,
            color_scheme: None,
            updated_at: bson::DateTime::from_chrono(now),
        }
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn compositions(mut self, compositions: Vec<Composition>) -> Self {
        self.compositions = Some(compositions);
        self
    }

    pub fn color_scheme(mut self, palette: ColorPalette) -> Self {
        self.color_scheme = Some(palette);
        self
    }
}

// Request bodies

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// PUT body: every present field is replaced
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub compositions: Option<Vec<Composition>>,
    #[serde(default)]
    pub color_scheme: Option<ColorPalette>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompositionsRequest {
    #[serde(default)]
    pub compositions: Vec<Composition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColorSchemeRequest {
    pub color_scheme: ColorPalette,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageRequest {
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}
