use crate::{Document, DocumentStore, Filter, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed view over one named collection of a [`DocumentStore`].
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    name: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            store: self.store.clone(),
            name: self.name,
            _entity: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str) -> Self {
        Collection {
            store,
            name,
            _entity: PhantomData,
        }
    }

    pub async fn ensure_unique_index(&self, fields: &[&str]) -> Result<(), StoreError> {
        self.store.ensure_unique_index(self.name, fields).await
    }

    pub async fn insert(&self, entity: &T) -> Result<(), StoreError> {
        self.store.insert(self.name, encode(entity)?).await
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<T, StoreError> {
        let document = self.store.find_one(self.name, filter).await?;
        decode(document)
    }

    /// Documents that fail to decode are logged and skipped.
    pub async fn find_many(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        let documents = self.store.find_many(self.name, filter).await?;

        Ok(documents
            .into_iter()
            .filter_map(|document| match decode(document) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!(collection = self.name, error = %e, "Skipping undecodable document");
                    None
                }
            })
            .collect())
    }

    /// Replaces the fields of the first document matching `filter` with those
    /// of `entity`. Returns the matched count.
    pub async fn update_one(&self, filter: &Filter, entity: &T) -> Result<u64, StoreError> {
        self.store
            .update_one(self.name, filter, encode(entity)?)
            .await
    }

    pub async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.store.delete_one(self.name, filter).await
    }
}

fn encode<T: Serialize>(entity: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(entity)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Backend(format!(
            "entity must serialize to an object, got {other}"
        ))),
    }
}

fn decode<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
