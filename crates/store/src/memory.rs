//! In-memory document store, used by tests and the demo binary.

use std::collections::HashMap;

use {async_trait::async_trait, tokio::sync::RwLock};

use crate::{Document, DocumentStore, Error, Result};

/// Process-local [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|existing| existing.id == doc.id) {
            return Err(Error::duplicate_id(doc.id));
        }
        docs.push(doc);
        Ok(())
    }

    async fn update(&self, collection: &str, doc: Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|existing| existing.id == doc.id) {
            Some(existing) => {
                *existing = doc;
                Ok(())
            },
            None => Err(Error::unknown_document(doc.id)),
        }
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn doc(id: &str) -> Document {
        Document {
            id: id.into(),
            owner_id: "u1".into(),
            body: json!({"n": id}),
        }
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = MemoryStore::new();
        store.insert("events", doc("a")).await.unwrap();
        assert_eq!(store.get("events", "a").await.unwrap(), Some(doc("a")));
    }

    #[tokio::test]
    async fn duplicate_insert_rejected() {
        let store = MemoryStore::new();
        store.insert("events", doc("a")).await.unwrap();
        assert!(matches!(
            store.insert("events", doc("a")).await,
            Err(Error::DuplicateId { .. })
        ));
    }

    #[tokio::test]
    async fn update_missing_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update("events", doc("a")).await,
            Err(Error::UnknownDocument { .. })
        ));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryStore::new();
        store.insert("events", doc("a")).await.unwrap();
        store.remove("events", "a").await.unwrap();
        store.remove("events", "a").await.unwrap();
        assert!(store.list("events").await.unwrap().is_empty());
    }
}
