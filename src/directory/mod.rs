//! Remote directory
//!
//! Federated sign-in and the shared document store holding groups,
//! memberships, weekly auditor rotations and group chat.

pub mod auth;
pub mod memory;
pub mod redis;
pub mod saga;
pub mod service;
pub mod store;

pub use auth::{AuthProvider, IdTokenClaims, JwtAuthProvider};
pub use memory::MemoryDocumentStore;
pub use redis::RedisDocumentStore;
pub use saga::Saga;
pub use service::DirectoryService;
pub use store::{Collection, Document, DocumentRef, DocumentStore};
