//! In-process document store.
//!
//! Backs dry runs and tests. Documents keep insertion order per collection.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::collection::Collection;
use crate::error::{DbError, DbResult};
use crate::id::DocumentId;
use crate::store::DocumentStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<(DocumentId, serde_json::Value)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection's documents in insertion order.
    pub fn documents(&self, collection: Collection) -> Vec<(DocumentId, serde_json::Value)> {
        self.collections
            .lock()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Fetch one document by id.
    pub fn get(&self, collection: Collection, id: &DocumentId) -> Option<serde_json::Value> {
        self.collections
            .lock()
            .get(&collection)?
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(_, doc)| doc.clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn describe(&self) -> String {
        "in-memory store".to_string()
    }

    async fn clear(&self, collection: Collection) -> DbResult<()> {
        self.collections.lock().remove(&collection);
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        id: &DocumentId,
        document: serde_json::Value,
    ) -> DbResult<()> {
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|(doc_id, _)| doc_id == id) {
            return Err(DbError::invalid_document(format!(
                "{collection} document {id} already exists"
            )));
        }
        docs.push((id.clone(), document));
        Ok(())
    }

    async fn set_product_rating(
        &self,
        product: &DocumentId,
        rating: f64,
        review_count: u64,
    ) -> DbResult<()> {
        let mut collections = self.collections.lock();
        let doc = collections
            .get_mut(&Collection::Products)
            .and_then(|docs| docs.iter_mut().find(|(id, _)| id == product))
            .and_then(|(_, doc)| doc.as_object_mut())
            .ok_or_else(|| DbError::not_found("products", product.as_str()))?;

        doc.insert("rating".to_string(), serde_json::json!(rating));
        doc.insert("review_count".to_string(), serde_json::json!(review_count));
        Ok(())
    }

    async fn count(&self, collection: Collection) -> DbResult<u64> {
        Ok(self
            .collections
            .lock()
            .get(&collection)
            .map_or(0, |docs| docs.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_insert_then_clear() {
        let store = MemoryStore::new();
        let id = DocumentId::generate();
        store
            .insert(Collection::Users, &id, json!({ "email": "a@example.com" }))
            .await
            .unwrap();

        assert_eq!(store.count(Collection::Users).await.unwrap(), 1);
        assert_eq!(
            store.get(Collection::Users, &id),
            Some(json!({ "email": "a@example.com" }))
        );

        store.clear(Collection::Users).await.unwrap();
        assert_eq!(store.count(Collection::Users).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = MemoryStore::new();
        let id = DocumentId::generate();
        store.insert(Collection::Carts, &id, json!({})).await.unwrap();
        assert!(store.insert(Collection::Carts, &id, json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_set_product_rating() {
        let store = MemoryStore::new();
        let id = DocumentId::generate();
        store
            .insert(
                Collection::Products,
                &id,
                json!({ "name": "Lamp", "rating": 0.0, "review_count": 0 }),
            )
            .await
            .unwrap();

        store.set_product_rating(&id, 4.5, 2).await.unwrap();

        assert_eq!(
            store.get(Collection::Products, &id),
            Some(json!({ "name": "Lamp", "rating": 4.5, "review_count": 2 }))
        );
    }

    #[tokio::test]
    async fn test_set_rating_on_missing_product() {
        let store = MemoryStore::new();
        let err = store
            .set_product_rating(&DocumentId::generate(), 3.0, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
