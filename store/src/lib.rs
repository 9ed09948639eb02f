//! Entity store contract used by the weather API.
//!
//! Entities are kept as JSON documents grouped into named collections. The
//! [`DocumentStore`] trait is the only surface the rest of the workspace talks
//! to; backend specific failures are translated into [`StoreError`] kinds
//! before they leave the store.

mod collection;
mod filter;
pub mod memory;

pub use collection::Collection;
pub use filter::Filter;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Primary key field of every document.
pub const ID_FIELD: &str = "_id";

pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no document matched the filter")]
    NotFound,

    #[error("duplicate key in {collection} on ({})", fields.join(", "))]
    DuplicateKey {
        collection: String,
        fields: Vec<String>,
    },

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Declares a unique constraint over `fields`. Idempotent.
    async fn ensure_unique_index(&self, collection: &str, fields: &[&str])
    -> Result<(), StoreError>;

    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Returns the first matching document or [`StoreError::NotFound`].
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Document, StoreError>;

    /// Returns every matching document. An empty result is not an error.
    async fn find_many(&self, collection: &str, filter: &Filter)
    -> Result<Vec<Document>, StoreError>;

    /// Overwrites the fields in `set` on the first document matching `filter`.
    /// The match and the write happen atomically. Returns the matched count.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<u64, StoreError>;

    /// Removes the first document matching `filter`. Returns the deleted count.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;
}
