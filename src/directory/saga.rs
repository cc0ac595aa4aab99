//! Compensable multi-document writes
//!
//! The document store has no multi-document transaction for writes. A saga
//! records how to undo each completed write so a failed sequence can be
//! unwound in reverse order.

use serde_json::Value;
use tracing::{error, warn};

use super::store::{Collection, DocumentStore};
use crate::utils::errors::Result;

#[derive(Debug)]
enum Compensation {
    /// The document did not exist before the step
    Remove { collection: Collection, id: String },
    Restore {
        collection: Collection,
        id: String,
        previous: Value,
    },
}

pub struct Saga<'a> {
    store: &'a dyn DocumentStore,
    name: &'static str,
    completed: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    pub fn new(store: &'a dyn DocumentStore, name: &'static str) -> Self {
        Self {
            store,
            name,
            completed: Vec::new(),
        }
    }

    /// Write a document whose previous state the caller already holds
    pub async fn put_with_previous(
        &mut self,
        collection: Collection,
        id: &str,
        document: Value,
        previous: Option<Value>,
    ) -> Result<()> {
        self.store.put(collection, id, document).await?;

        self.completed.push(match previous {
            Some(previous) => Compensation::Restore {
                collection,
                id: id.to_string(),
                previous,
            },
            None => Compensation::Remove {
                collection,
                id: id.to_string(),
            },
        });
        Ok(())
    }

    /// Write a brand-new document
    pub async fn create(
        &mut self,
        collection: Collection,
        id: &str,
        document: Value,
    ) -> Result<()> {
        self.put_with_previous(collection, id, document, None).await
    }

    /// Keep every completed write
    pub fn commit(self) -> usize {
        self.completed.len()
    }

    /// Undo completed writes newest first. Failures are logged and skipped.
    pub async fn compensate(self) {
        let total = self.completed.len();
        let mut failed = 0;

        for step in self.completed.into_iter().rev() {
            let outcome = match &step {
                Compensation::Remove { collection, id } => self.store.delete(*collection, id).await,
                Compensation::Restore {
                    collection,
                    id,
                    previous,
                } => self.store.put(*collection, id, previous.clone()).await,
            };

            if let Err(e) = outcome {
                failed += 1;
                error!(saga = self.name, step = ?step, error = %e, "Compensation failed");
            }
        }

        warn!(saga = self.name, undone = total - failed, failed = failed, "Saga rolled back");
    }
}
