//! Persistent domain-document store collaborator.
//!
//! Domain logic (command modules) reads and writes opaque JSON documents
//! keyed by id and owner. The dispatcher pipeline never touches this store.

pub mod error;
pub mod memory;

pub use {
    error::{Error, Result},
    memory::MemoryStore,
};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// One stored domain document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    /// User id of the record's owner.
    pub owner_id: String,
    pub body: Value,
}

/// Document store collaborator. Collections are named; documents are opaque.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;
    async fn insert(&self, collection: &str, doc: Document) -> Result<()>;
    async fn update(&self, collection: &str, doc: Document) -> Result<()>;
    async fn remove(&self, collection: &str, id: &str) -> Result<()>;
}
