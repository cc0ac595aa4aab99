//! Document store abstraction
//!
//! The remote directory keeps flat collections of JSON documents keyed by
//! the entity's own id. Equality on a single field is the only query shape.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::{AppUser, ChatMessage, Group, GroupMember, WeeklyAuditor};
use crate::utils::errors::{AuditError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Groups,
    GroupMembers,
    WeeklyAuditors,
    ChatMessages,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Groups => "groups",
            Collection::GroupMembers => "group_members",
            Collection::WeeklyAuditors => "weekly_auditors",
            Collection::ChatMessages => "chat_messages",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Address of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub collection: Collection,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

/// Backend holding the remote collections.
///
/// Each call is one round trip. Only `delete_batch` and
/// `increment_clamped` are atomic; everything else is last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or replace a document
    async fn put(&self, collection: Collection, id: &str, document: Value) -> Result<()>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// Every document whose top-level `field` equals `value`
    async fn query_eq(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>>;

    /// Deleting a missing document is not an error
    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;

    /// Delete all documents as one unit
    async fn delete_batch(&self, documents: &[DocumentRef]) -> Result<()>;

    /// Add `delta` to a numeric field, never going below `min`; returns the new value
    async fn increment_clamped(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
        min: i64,
    ) -> Result<i64>;
}

/// A model stored as a document in one collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn document_id(&self) -> &str;
}

impl Document for AppUser {
    const COLLECTION: Collection = Collection::Users;

    fn document_id(&self) -> &str {
        &self.uid
    }
}

impl Document for Group {
    const COLLECTION: Collection = Collection::Groups;

    fn document_id(&self) -> &str {
        &self.id
    }
}

impl Document for GroupMember {
    const COLLECTION: Collection = Collection::GroupMembers;

    fn document_id(&self) -> &str {
        &self.id
    }
}

impl Document for WeeklyAuditor {
    const COLLECTION: Collection = Collection::WeeklyAuditors;

    fn document_id(&self) -> &str {
        &self.id
    }
}

impl Document for ChatMessage {
    const COLLECTION: Collection = Collection::ChatMessages;

    fn document_id(&self) -> &str {
        &self.id
    }
}

/// Serialize and store a model under its own id
pub async fn put_document<T: Document>(store: &dyn DocumentStore, document: &T) -> Result<()> {
    let value = serde_json::to_value(document)?;
    store.put(T::COLLECTION, document.document_id(), value).await
}

pub async fn get_document<T: Document>(store: &dyn DocumentStore, id: &str) -> Result<Option<T>> {
    match store.get(T::COLLECTION, id).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Typed [`DocumentStore::query_eq`] on a string field
pub async fn query_documents<T: Document>(
    store: &dyn DocumentStore,
    field: &str,
    value: &str,
) -> Result<Vec<T>> {
    store
        .query_eq(T::COLLECTION, field, &Value::String(value.to_string()))
        .await?
        .into_iter()
        .map(|document| serde_json::from_value::<T>(document).map_err(AuditError::from))
        .collect()
}
