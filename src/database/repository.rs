use std::marker::PhantomData;
use std::sync::Arc;

use bson::{doc, oid::ObjectId, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};

use super::collection::{DocumentCollection, StoreError};

/// Rank field injected by `select_ids` in preserve-order mode
pub const ORDER_FIELD: &str = "__order";

/// Result ordering for `Repository::select_ids`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Newest identifier first
    IdDescending,
    /// Sorted by the input position, descending. An ascending input list
    /// therefore comes back reversed.
    Preserve,
}

/// Parses a 24-character hex identifier
pub fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidIdentifier(id.to_string()))
}

/// Typed access to one collection. Every read decodes into `T`.
pub struct Repository<T> {
    collection: Arc<dyn DocumentCollection>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: DeserializeOwned + Send,
{
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            _phantom: PhantomData,
        }
    }

    pub fn collection(&self) -> &Arc<dyn DocumentCollection> {
        &self.collection
    }

    /// Exactly one document matching `filter`, or `NotFound`
    pub async fn select_404(&self, filter: Document) -> Result<T, StoreError> {
        match self.collection.find_one(filter).await? {
            Some(document) => Ok(bson::from_document(document)?),
            None => Err(StoreError::NotFound),
        }
    }

    pub async fn select_id(&self, id: &str) -> Result<T, StoreError> {
        let object_id = parse_object_id(id)?;
        self.select_404(doc! { "_id": object_id }).await
    }

    pub async fn select_by(&self, field: &str, value: impl Into<Bson>) -> Result<T, StoreError> {
        let mut filter = Document::new();
        filter.insert(field, value.into());
        self.select_404(filter).await
    }

    /// Runs an aggregation pipeline. No matches is an empty vector.
    pub async fn select_any(&self, pipeline: Vec<Document>) -> Result<Vec<T>, StoreError> {
        let documents = self.collection.aggregate(pipeline).await?;
        documents
            .into_iter()
            .map(|document| bson::from_document(document).map_err(StoreError::from))
            .collect()
    }

    /// `select_any` followed by a descending sort on `sort_field`
    pub async fn select_sorted(&self, mut pipeline: Vec<Document>, sort_field: &str) -> Result<Vec<T>, StoreError> {
        let mut sort = Document::new();
        sort.insert(sort_field, -1);
        pipeline.push(doc! { "$sort": sort });
        self.select_any(pipeline).await
    }

    pub async fn select_ids(&self, ids: &[ObjectId], order: ListOrder) -> Result<Vec<T>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let matcher = doc! { "$match": { "_id": { "$in": ids.to_vec() } } };
        let pipeline = match order {
            ListOrder::IdDescending => vec![matcher, doc! { "$sort": { "_id": -1 } }],
            ListOrder::Preserve => {
                let mut rank = Document::new();
                rank.insert(ORDER_FIELD, doc! { "$indexOfArray": [ids.to_vec(), "$_id"] });
                let mut sort = Document::new();
                sort.insert(ORDER_FIELD, -1);
                vec![matcher, doc! { "$addFields": rank }, doc! { "$sort": sort }]
            }
        };

        self.select_any(pipeline).await
    }

    /// `$set` merge of `partial` into the identified document
    pub async fn update_id<P>(&self, id: &str, partial: &P) -> Result<(), StoreError>
    where
        P: Serialize + ?Sized,
    {
        let object_id = parse_object_id(id)?;
        let fields = bson::to_document(partial)?;

        let outcome = self
            .collection
            .update_one(doc! { "_id": object_id }, doc! { "$set": fields })
            .await?;

        if outcome.matched == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Deleting a missing document is not an error
    pub async fn delete_id(&self, id: &str) -> Result<(), StoreError> {
        let object_id = parse_object_id(id)?;
        self.collection.delete_one(doc! { "_id": object_id }).await?;
        Ok(())
    }
}
