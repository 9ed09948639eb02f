// In-process document store. Every collection lives behind a single RwLock so
// the filter match and the write of `update_one` are observed atomically by
// concurrent callers.
use crate::{Document, DocumentStore, Filter, ID_FIELD, StoreError};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
struct CollectionData {
    // Keyed by the serialized `_id`, kept in insertion order.
    documents: IndexMap<String, Document>,
    unique_indexes: Vec<Vec<String>>,
}

impl CollectionData {
    fn first_match(&self, filter: &Filter) -> Option<&String> {
        self.documents
            .iter()
            .find(|(_, document)| filter.matches(document))
            .map(|(key, _)| key)
    }

    /// Returns the first unique index `candidate` would violate. `skip` is the
    /// key of the document being replaced, if any.
    fn violated_index(&self, candidate: &Document, skip: Option<&str>) -> Option<&Vec<String>> {
        self.unique_indexes.iter().find(|fields| {
            let Some(key) = index_key(candidate, fields) else {
                return false;
            };
            self.documents
                .iter()
                .filter(|(k, _)| Some(k.as_str()) != skip)
                .any(|(_, existing)| index_key(existing, fields).as_ref() == Some(&key))
        })
    }
}

// Documents missing any indexed field are not constrained by that index.
fn index_key<'a>(document: &'a Document, fields: &[String]) -> Option<Vec<&'a Value>> {
    fields.iter().map(|f| document.get(f)).collect()
}

fn primary_key(document: &Document) -> Result<String, StoreError> {
    document
        .get(ID_FIELD)
        .map(Value::to_string)
        .ok_or_else(|| StoreError::Backend(format!("document is missing `{ID_FIELD}`")))
}

fn duplicate(collection: &str, fields: &[String]) -> StoreError {
    StoreError::DuplicateKey {
        collection: collection.to_string(),
        fields: fields.to_vec(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, CollectionData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_unique_index(
        &self,
        collection: &str,
        fields: &[&str],
    ) -> Result<(), StoreError> {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();

        let mut write_guard = self.collections.write();
        let data = write_guard.entry(collection.to_string()).or_default();
        if data.unique_indexes.contains(&fields) {
            return Ok(());
        }

        // Refuse to declare a constraint the stored documents already break.
        let mut seen = Vec::new();
        for document in data.documents.values() {
            if let Some(key) = index_key(document, &fields) {
                if seen.contains(&key) {
                    return Err(duplicate(collection, &fields));
                }
                seen.push(key);
            }
        }

        tracing::debug!(collection, ?fields, "Created unique index");
        data.unique_indexes.push(fields);
        Ok(())
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let key = primary_key(&document)?;

        let mut write_guard = self.collections.write();
        let data = write_guard.entry(collection.to_string()).or_default();

        if data.documents.contains_key(&key) {
            return Err(duplicate(collection, &[ID_FIELD.to_string()]));
        }
        if let Some(fields) = data.violated_index(&document, None) {
            return Err(duplicate(collection, fields));
        }

        data.documents.insert(key, document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Document, StoreError> {
        let read_guard = self.collections.read();
        read_guard
            .get(collection)
            .and_then(|data| {
                data.first_match(filter)
                    .and_then(|key| data.documents.get(key))
            })
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let read_guard = self.collections.read();
        let Some(data) = read_guard.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(data
            .documents
            .values()
            .filter(|document| filter.matches(document))
            .cloned()
            .collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<u64, StoreError> {
        let mut write_guard = self.collections.write();
        let Some(data) = write_guard.get_mut(collection) else {
            return Ok(0);
        };
        let Some(key) = data.first_match(filter).cloned() else {
            return Ok(0);
        };

        let mut updated = data.documents[&key].clone();
        for (field, value) in set {
            updated.insert(field, value);
        }

        if primary_key(&updated)? != key {
            return Err(StoreError::Backend(format!(
                "`{ID_FIELD}` cannot be modified"
            )));
        }
        if let Some(fields) = data.violated_index(&updated, Some(key.as_str())) {
            return Err(duplicate(collection, fields));
        }

        data.documents.insert(key, updated);
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut write_guard = self.collections.write();
        let Some(data) = write_guard.get_mut(collection) else {
            return Ok(0);
        };
        let Some(key) = data.first_match(filter).cloned() else {
            return Ok(0);
        };

        data.documents.shift_remove(&key);
        Ok(1)
    }
}
