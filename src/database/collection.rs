use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use thiserror::Error;

/// Errors surfaced by the document store and the typed accessors built on it
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("no documents in result")]
    NotFound,

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Driver(#[source] mongodb::error::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        // 11000 is the server's duplicate key code
        if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
            if write_error.code == 11000 {
                return StoreError::Duplicate(write_error.message.clone());
            }
        }
        StoreError::Driver(err)
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Result of a single-document update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Raw single-collection operations. Filters, updates and pipelines use the
/// MongoDB query language; typed access lives in `Repository`.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError>;

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError>;

    /// Inserts a document and returns its `_id`
    async fn insert_one(&self, document: Document) -> Result<ObjectId, StoreError>;

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateOutcome, StoreError>;

    /// Returns the number of deleted documents (0 or 1)
    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError>;
}

/// A database: named collections plus a liveness probe
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection>;

    async fn ping(&self) -> Result<(), StoreError>;
}
