//! In-memory document store.
//!
//! Models the subset of the MongoDB query language the service issues:
//! equality and `$in` filters (dotted paths allowed), `$set` / `$push` /
//! `$addToSet` / `$pull` updates, and `$match` / `$sort` / `$addFields`
//! (`$indexOfArray`) pipeline stages. Anything else is `Unsupported`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};

use crate::database::collection::{DocumentCollection, DocumentStore, StoreError, UpdateOutcome};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
    unavailable: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a unique field, mirroring a unique index
    pub fn unique(&self, collection: &str, field: &str) {
        self.memory_collection(collection)
            .unique_fields
            .lock()
            .unwrap()
            .push(field.to_string());
    }

    /// Concrete handle, for tests that inspect call counts or inject failures
    pub fn memory_collection(&self, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        self.memory_collection(name)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unsupported("store marked unavailable".into()));
        }
        Ok(())
    }
}

/// Which operation a scripted failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    FindOne,
    Aggregate,
    Insert,
    Update,
    Delete,
}

pub struct MemoryCollection {
    name: String,
    documents: Mutex<Vec<Document>>,
    unique_fields: Mutex<Vec<String>>,
    failures: Mutex<Vec<(FailOn, String)>>,
    calls: AtomicUsize,
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            documents: Mutex::new(Vec::new()),
            unique_fields: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of operations issued against this collection
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The next `op` call fails with `message`
    pub fn fail_next(&self, op: FailOn, message: &str) {
        self.failures.lock().unwrap().push((op, message.to_string()));
    }

    fn begin(&self, op: FailOn) -> Result<(), StoreError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let mut failures = self.failures.lock().unwrap();
        if let Some(index) = failures.iter().position(|(fail_on, _)| *fail_on == op) {
            let (_, message) = failures.remove(index);
            return Err(StoreError::Unsupported(message));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError> {
        self.begin(FailOn::FindOne)?;
        let documents = self.documents.lock().unwrap();
        for document in documents.iter() {
            if matches_filter(document, &filter)? {
                return Ok(Some(document.clone()));
            }
        }
        Ok(None)
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        self.begin(FailOn::Aggregate)?;
        let mut working: Vec<Document> = self.documents.lock().unwrap().clone();

        for stage in &pipeline {
            let (operator, argument) = single_entry(stage)?;
            let argument = as_document(argument, operator)?;
            working = match operator {
                "$match" => {
                    let mut kept = Vec::new();
                    for document in working {
                        if matches_filter(&document, argument)? {
                            kept.push(document);
                        }
                    }
                    kept
                }
                "$sort" => {
                    let keys: Vec<(String, bool)> = argument
                        .iter()
                        .map(|(key, direction)| (key.clone(), direction_is_descending(direction)))
                        .collect();
                    working.sort_by(|a, b| {
                        for (key, descending) in &keys {
                            let ordering = compare_bson(lookup(a, key), lookup(b, key));
                            let ordering = if *descending { ordering.reverse() } else { ordering };
                            if ordering != Ordering::Equal {
                                return ordering;
                            }
                        }
                        Ordering::Equal
                    });
                    working
                }
                "$addFields" => {
                    for document in working.iter_mut() {
                        for (field, expression) in argument {
                            let value = evaluate(document, expression)?;
                            set_path(document, field, value)?;
                        }
                    }
                    working
                }
                other => return Err(StoreError::Unsupported(format!("pipeline stage {}", other))),
            };
        }

        Ok(working)
    }

    async fn insert_one(&self, mut document: Document) -> Result<ObjectId, StoreError> {
        self.begin(FailOn::Insert)?;
        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => return Err(StoreError::Unsupported(format!("non-ObjectId _id {}", other))),
            None => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
        };

        let mut documents = self.documents.lock().unwrap();
        let unique_fields = self.unique_fields.lock().unwrap();
        for field in std::iter::once("_id").chain(unique_fields.iter().map(String::as_str)) {
            if let Some(value) = lookup(&document, field) {
                if documents.iter().any(|existing| lookup(existing, field) == Some(value)) {
                    return Err(StoreError::Duplicate(format!(
                        "E11000 duplicate key error collection: {} index: {}_1",
                        self.name, field
                    )));
                }
            }
        }

        documents.push(document);
        Ok(id)
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateOutcome, StoreError> {
        self.begin(FailOn::Update)?;
        let mut documents = self.documents.lock().unwrap();

        let mut target = None;
        for (index, document) in documents.iter().enumerate() {
            if matches_filter(document, &filter)? {
                target = Some(index);
                break;
            }
        }
        let Some(index) = target else {
            return Ok(UpdateOutcome { matched: 0, modified: 0 });
        };

        let before = documents[index].clone();
        let document = &mut documents[index];
        for (operator, fields) in update.iter() {
            let fields = as_document(fields, operator)?;
            for (path, value) in fields {
                match operator.as_str() {
                    "$set" => set_path(document, path, value.clone())?,
                    "$push" => array_at(document, path)?.push(value.clone()),
                    "$addToSet" => {
                        let array = array_at(document, path)?;
                        if !array.contains(value) {
                            array.push(value.clone());
                        }
                    }
                    "$pull" => array_at(document, path)?.retain(|item| item != value),
                    other => return Err(StoreError::Unsupported(format!("update operator {}", other))),
                }
            }
        }

        let modified = u64::from(*document != before);
        Ok(UpdateOutcome { matched: 1, modified })
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError> {
        self.begin(FailOn::Delete)?;
        let mut documents = self.documents.lock().unwrap();
        for index in 0..documents.len() {
            if matches_filter(&documents[index], &filter)? {
                documents.remove(index);
                return Ok(1);
            }
        }
        Ok(0)
    }
}

fn single_entry(stage: &Document) -> Result<(&str, &Bson), StoreError> {
    let mut entries = stage.iter();
    match (entries.next(), entries.next()) {
        (Some((key, value)), None) => Ok((key.as_str(), value)),
        _ => Err(StoreError::Unsupported(format!("pipeline stage {}", stage))),
    }
}

fn as_document<'a>(value: &'a Bson, context: &str) -> Result<&'a Document, StoreError> {
    match value {
        Bson::Document(document) => Ok(document),
        other => Err(StoreError::Unsupported(format!("{} expects a document, got {}", context, other))),
    }
}

fn direction_is_descending(direction: &Bson) -> bool {
    match direction {
        Bson::Int32(n) => *n < 0,
        Bson::Int64(n) => *n < 0,
        Bson::Double(n) => *n < 0.0,
        _ => false,
    }
}

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> Result<(), StoreError> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                if document.contains_key(head) {
                    return Err(StoreError::Unsupported(format!("cannot set {} inside a non-document", path)));
                }
                document.insert(head, Document::new());
            }
            match document.get_mut(head) {
                Some(Bson::Document(inner)) => set_path(inner, rest, value),
                _ => Err(StoreError::Unsupported(format!("cannot set {}", path))),
            }
        }
    }
}

/// Array at `path`, created empty when absent
fn array_at<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut Vec<Bson>, StoreError> {
    if lookup(document, path).is_none() {
        set_path(document, path, Bson::Array(Vec::new()))?;
    }

    let mut current = document;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = current
            .get_mut(segment)
            .ok_or_else(|| StoreError::Unsupported(format!("missing path {}", path)))?;
        if segments.peek().is_none() {
            return match value {
                Bson::Array(array) => Ok(array),
                other => Err(StoreError::Unsupported(format!("{} is not an array: {}", path, other))),
            };
        }
        current = match value {
            Bson::Document(inner) => inner,
            _ => return Err(StoreError::Unsupported(format!("cannot descend into {}", path))),
        };
    }
    Err(StoreError::Unsupported(format!("empty path {}", path)))
}

fn matches_filter(document: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (path, condition) in filter {
        let actual = lookup(document, path);
        let matched = match condition {
            Bson::Document(operators) if operators.keys().any(|k| k.starts_with('$')) => {
                let mut all = true;
                for (operator, operand) in operators {
                    all &= match operator.as_str() {
                        "$in" => match operand {
                            Bson::Array(candidates) => actual.map_or(false, |v| candidates.contains(v)),
                            other => return Err(StoreError::Unsupported(format!("$in expects an array, got {}", other))),
                        },
                        "$eq" => actual == Some(operand),
                        "$ne" => actual != Some(operand),
                        other => return Err(StoreError::Unsupported(format!("query operator {}", other))),
                    };
                }
                all
            }
            expected => actual == Some(expected),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn evaluate(document: &Document, expression: &Bson) -> Result<Bson, StoreError> {
    match expression {
        Bson::String(reference) if reference.starts_with('$') => {
            Ok(lookup(document, &reference[1..]).cloned().unwrap_or(Bson::Null))
        }
        Bson::Document(inner) if inner.keys().any(|k| k.starts_with('$')) => {
            let (operator, argument) = single_entry(inner)?;
            match (operator, argument) {
                ("$indexOfArray", Bson::Array(arguments)) if arguments.len() == 2 => {
                    let haystack = evaluate(document, &arguments[0])?;
                    let needle = evaluate(document, &arguments[1])?;
                    match haystack {
                        Bson::Array(items) => {
                            let position = items.iter().position(|item| *item == needle);
                            Ok(Bson::Int32(position.map_or(-1, |p| p as i32)))
                        }
                        _ => Ok(Bson::Null),
                    }
                }
                _ => Err(StoreError::Unsupported(format!("expression {}", inner))),
            }
        }
        literal => Ok(literal.clone()),
    }
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Missing and null sort first, like the server's ascending order
fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let a = a.filter(|v| !matches!(v, Bson::Null));
    let b = b.filter(|v| !matches!(v, Bson::Null));
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
                return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            }
            match (a, b) {
                (Bson::String(x), Bson::String(y)) => x.cmp(y),
                (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
                (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
                (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
                _ => Ordering::Equal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn update_operators_follow_server_semantics() {
        let store = MemoryStore::new();
        let collection = store.collection("things");
        let id = collection.insert_one(doc! { "meta": { "a": 1 } }).await.unwrap();
        let member = ObjectId::new();

        let outcome = collection
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "meta.b": 2 },
                    "$addToSet": { "refs": member },
                    "$push": { "log": "x" },
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 1 });

        collection
            .update_one(doc! { "_id": id }, doc! { "$addToSet": { "refs": member } })
            .await
            .unwrap();
        let stored = collection.find_one(doc! { "_id": id }).await.unwrap().unwrap();
        assert_eq!(stored.get_document("meta").unwrap(), &doc! { "a": 1, "b": 2 });
        assert_eq!(stored.get_array("refs").unwrap().len(), 1);

        collection
            .update_one(doc! { "_id": id }, doc! { "$pull": { "refs": member } })
            .await
            .unwrap();
        let stored = collection.find_one(doc! { "_id": id }).await.unwrap().unwrap();
        assert!(stored.get_array("refs").unwrap().is_empty());
    }

    #[tokio::test]
    async fn unique_fields_reject_duplicates() {
        let store = MemoryStore::new();
        store.unique("users", "uid");
        let users = store.collection("users");

        users.insert_one(doc! { "uid": "a" }).await.unwrap();
        let err = users.insert_one(doc! { "uid": "a" }).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn scripted_failures_fire_once() {
        let store = MemoryStore::new();
        let handle = store.memory_collection("things");
        handle.fail_next(FailOn::FindOne, "boom");

        let collection = store.collection("things");
        assert!(collection.find_one(doc! {}).await.is_err());
        assert!(collection.find_one(doc! {}).await.unwrap().is_none());
        assert_eq!(handle.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_stage_is_unsupported() {
        let store = MemoryStore::new();
        let err = store
            .collection("things")
            .aggregate(vec![doc! { "$lookup": {} }])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unsupported(_)));
    }
}
