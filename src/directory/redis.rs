//! Redis-backed document store
//!
//! Each collection is one hash `{prefix}{collection}` mapping document id to
//! its JSON encoding. Batch deletes run inside MULTI/EXEC and counters are
//! adjusted by a Lua script so both are atomic on the server.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::{debug, info};

use super::store::{Collection, DocumentRef, DocumentStore};
use crate::utils::errors::Result;

const INCREMENT_CLAMPED: &str = r#"
local raw = redis.call('HGET', KEYS[1], ARGV[1])
if not raw then
    return redis.error_reply('document not found: ' .. KEYS[1] .. '/' .. ARGV[1])
end
local document = cjson.decode(raw)
local value = (tonumber(document[ARGV[2]]) or 0) + tonumber(ARGV[3])
local floor = tonumber(ARGV[4])
if value < floor then
    value = floor
end
document[ARGV[2]] = value
redis.call('HSET', KEYS[1], ARGV[1], cjson.encode(document))
return value
"#;

#[derive(Clone)]
pub struct RedisDocumentStore {
    connection_manager: ConnectionManager,
    prefix: String,
}

impl RedisDocumentStore {
    /// Connect and keep a managed connection that reconnects on failure
    pub async fn connect(url: &str, prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection_manager = ConnectionManager::new(client).await?;
        info!(prefix = prefix, "Connected to redis document store");

        Ok(Self {
            connection_manager,
            prefix: prefix.to_string(),
        })
    }

    fn key(&self, collection: Collection) -> String {
        format!("{}{}", self.prefix, collection.name())
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn put(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let serialized = serde_json::to_string(&document)?;
        let _: () = conn.hset(self.key(collection), id, serialized).await?;
        debug!(collection = %collection, id = id, "Document written");
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let mut conn = self.connection_manager.clone();
        let raw: Option<String> = conn.hget(self.key(collection), id).await?;

        match raw {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn query_eq(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let mut conn = self.connection_manager.clone();
        let raw: Vec<String> = conn.hvals(self.key(collection)).await?;

        let mut matches = Vec::new();
        for data in raw {
            let document: Value = serde_json::from_str(&data)?;
            if document.get(field) == Some(value) {
                matches.push(document);
            }
        }

        debug!(collection = %collection, field = field, matches = matches.len(), "Query executed");
        Ok(matches)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: () = conn.hdel(self.key(collection), id).await?;
        Ok(())
    }

    async fn delete_batch(&self, documents: &[DocumentRef]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for document in documents {
            pipe.hdel(self.key(document.collection), &document.id).ignore();
        }

        let mut conn = self.connection_manager.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        debug!(count = documents.len(), "Batch delete committed");
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
        let mut conn = self.connection_manager.clone();
        let value: i64 = redis::Script::new(INCREMENT_CLAMPED)
            .key(self.key(collection))
            .arg(id)
            .arg(field)
            .arg(delta)
            .arg(min)
            .invoke_async(&mut conn)
            .await?;

        Ok(value)
    }
}
