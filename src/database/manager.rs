use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

use super::collection::{DocumentCollection, DocumentStore, StoreError, UpdateOutcome};
use crate::config::DatabaseConfig;

pub const USERS_COLLECTION: &str = "users";
pub const PROJECTS_COLLECTION: &str = "projects";

/// Owns the MongoDB client for the lifetime of the server
pub struct DatabaseManager {
    client: Client,
    database: Database,
    operation_timeout: Duration,
}

impl DatabaseManager {
    /// Connects, verifies connectivity and creates the indexes the handlers rely on
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let connect_timeout = Duration::from_secs(config.connection_timeout);

        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some("studio-api".to_string());
        options.connect_timeout = Some(connect_timeout);
        options.server_selection_timeout = Some(connect_timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.name);

        let manager = Self {
            client,
            database,
            operation_timeout: Duration::from_secs(config.operation_timeout),
        };

        manager.health_check().await?;
        manager.ensure_indexes().await?;

        info!("Connected to MongoDB database: {}", config.name);
        Ok(manager)
    }

    /// `uid` identifies the identity-provider account and must stay unique
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "uid": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.database
            .collection::<Document>(USERS_COLLECTION)
            .create_index(index, None)
            .await?;

        info!("Ensured unique index on {}.uid", USERS_COLLECTION);
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        timed(self.operation_timeout, self.database.run_command(doc! { "ping": 1 }, None)).await?;
        Ok(())
    }

    /// Handle used by the router state
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::new(MongoStore {
            database: self.database.clone(),
            operation_timeout: self.operation_timeout,
        })
    }

    /// Closes pooled connections (e.g., on shutdown)
    pub async fn close(self) {
        self.client.shutdown().await;
        info!("Closed MongoDB client");
    }
}

/// Bounds a driver call by the configured operation timeout
async fn timed<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, mongodb::error::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

pub struct MongoStore {
    database: Database,
    operation_timeout: Duration,
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(MongoCollection {
            inner: self.database.collection::<Document>(name),
            operation_timeout: self.operation_timeout,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        timed(self.operation_timeout, self.database.run_command(doc! { "ping": 1 }, None)).await?;
        Ok(())
    }
}

pub struct MongoCollection {
    inner: Collection<Document>,
    operation_timeout: Duration,
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError> {
        timed(self.operation_timeout, self.inner.find_one(filter, None)).await
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let limit = self.operation_timeout;
        timed(limit, async {
            let cursor = self.inner.aggregate(pipeline, None).await?;
            cursor.try_collect::<Vec<Document>>().await
        })
        .await
    }

    async fn insert_one(&self, document: Document) -> Result<ObjectId, StoreError> {
        let result = timed(self.operation_timeout, self.inner.insert_one(document, None)).await?;
        result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::Unsupported(format!(
                "inserted id in {} is not an ObjectId: {}",
                self.inner.name(),
                result.inserted_id
            ))
        })
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateOutcome, StoreError> {
        let result = timed(self.operation_timeout, self.inner.update_one(filter, update, None)).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError> {
        let result = timed(self.operation_timeout, self.inner.delete_one(filter, None)).await?;
        Ok(result.deleted_count)
    }
}
