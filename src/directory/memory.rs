//! In-process document store

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::store::{Collection, DocumentRef, DocumentStore};
use crate::utils::errors::{AuditError, Result};

/// Document store held in memory, used by tests and single-device setups
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn query_eq(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|document| document.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        if let Some(documents) = self.collections.write().await.get_mut(&collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn delete_batch(&self, documents: &[DocumentRef]) -> Result<()> {
        // One write guard for the whole batch.
        let mut collections = self.collections.write().await;
        for document in documents {
            if let Some(stored) = collections.get_mut(&document.collection) {
                stored.remove(&document.id);
            }
        }
        Ok(())
    }

    async fn increment_clamped(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
        min: i64,
    ) -> Result<i64> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| AuditError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let current = document.get(field).and_then(Value::as_i64).unwrap_or(0);
        let updated = current.saturating_add(delta).max(min);

        match document.as_object_mut() {
            Some(object) => {
                object.insert(field.to_string(), Value::from(updated));
                Ok(updated)
            }
            None => Err(AuditError::Validation(format!(
                "{}/{} is not an object",
                collection, id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_query_eq_matches_field() {
        let store = MemoryDocumentStore::new();
        for (id, code) in [("a", "111111"), ("b", "222222")] {
            store
                .put(Collection::Groups, id, json!({"id": id, "inviteCode": code}))
                .await
                .unwrap();
        }

        let found = store
            .query_eq(Collection::Groups, "inviteCode", &json!("222222"))
            .await
            .unwrap();
        assert_eq!(found, vec![json!({"id": "b", "inviteCode": "222222"})]);
    }

    #[tokio::test]
    async fn test_increment_clamps_at_min() {
        let store = MemoryDocumentStore::new();
        store.put(Collection::Groups, "g", json!({"memberCount": 1})).await.unwrap();

        for (delta, expected) in [(-1, 0), (-1, 0), (2, 2)] {
            let count = store
                .increment_clamped(Collection::Groups, "g", "memberCount", delta, 0)
                .await
                .unwrap();
            assert_eq!(count, expected);
        }
    }

    #[tokio::test]
    async fn test_increment_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let result = store.increment_clamped(Collection::Groups, "nope", "memberCount", 1, 0).await;
        assert!(matches!(result, Err(AuditError::DocumentNotFound { .. })));
    }
}
