//! Directory test helpers
//!
//! Token minting for the JWT provider and a document store wrapper whose
//! writes can be made to fail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use s5_audit::config::{AuthConfig, DirectoryConfig};
use s5_audit::directory::{
    AuthProvider, Collection, DirectoryService, DocumentRef, DocumentStore, IdTokenClaims,
    JwtAuthProvider, MemoryDocumentStore,
};
use s5_audit::models::AppUser;
use s5_audit::{AuditError, Result};
use serde_json::Value;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        token_secret: TEST_SECRET.to_string(),
        issuer: None,
    }
}

pub fn mint_token(uid: &str, email: &str, name: Option<&str>) -> String {
    let claims = IdTokenClaims {
        sub: uid.to_string(),
        email: email.to_string(),
        name: name.map(str::to_string),
        picture: None,
        exp: (Utc::now().timestamp() + 3600) as usize,
        iss: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to mint token")
}

pub fn directory_service(store: Arc<dyn DocumentStore>) -> DirectoryService {
    let auth: Arc<dyn AuthProvider> =
        Arc::new(JwtAuthProvider::new(&test_auth_config()).expect("Failed to build auth provider"));
    DirectoryService::new(auth, store, DirectoryConfig::default())
}

/// A directory service with its own session, signed in as `uid`
pub async fn signed_in(
    store: Arc<dyn DocumentStore>,
    uid: &str,
    name: &str,
) -> (DirectoryService, AppUser) {
    let service = directory_service(store);
    let token = mint_token(uid, &format!("{}@plant.example", uid), Some(name));
    let user = service
        .sign_in_with_federated_account(&token)
        .await
        .expect("Sign-in failed");
    (service, user)
}

#[derive(Debug)]
struct FailRule {
    collection: Collection,
    /// Writes still allowed before failing
    remaining: usize,
}

/// Delegates to a [`MemoryDocumentStore`] but fails `put`s as configured
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: MemoryDocumentStore,
    rules: Mutex<Vec<FailRule>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every put into `collection` after `allowed` more successful ones
    pub fn fail_puts_after(&self, collection: Collection, allowed: usize) {
        self.rules.lock().unwrap().push(FailRule {
            collection,
            remaining: allowed,
        });
    }

    pub fn heal(&self) {
        self.rules.lock().unwrap().clear();
    }

    fn check(&self, collection: Collection) -> Result<()> {
        let mut rules = self.rules.lock().unwrap();
        match rules.iter_mut().find(|rule| rule.collection == collection) {
            Some(rule) if rule.remaining == 0 => Err(AuditError::ServiceUnavailable(format!(
                "injected write failure on {}",
                collection
            ))),
            Some(rule) => {
                rule.remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn put(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        self.check(collection)?;
        self.inner.put(collection, id, document).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn query_eq(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        self.inner.query_eq(collection, field, value).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.inner.delete(collection, id).await
    }

    async fn delete_batch(&self, documents: &[DocumentRef]) -> Result<()> {
        self.inner.delete_batch(documents).await
    }

    async fn increment_clamped(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
        min: i64,
    ) -> Result<i64> {
        self.inner.increment_clamped(collection, id, field, delta, min).await
    }
}
