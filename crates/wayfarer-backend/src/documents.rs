//! Document database collaborator surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;

/// A single document: an opaque string id plus a JSON body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: serde_json::Value,
}

impl Document {
    /// Deserialize the body into a typed record.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Document database collaborator.
///
/// Live queries follow replace-on-push semantics: every broadcast carries the
/// full current result set for the collection, in backend-determined order.
/// Subscribers receive pushes for writes that happen after they subscribe;
/// callers wanting the current state issue a [`DocumentStore::list`] first.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document.  Fails with `NotFound` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Document>;

    /// Snapshot of an entire collection.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Subscribe to live snapshots of a collection.
    fn watch(&self, collection: &str) -> broadcast::Receiver<Vec<Document>>;

    /// Merge `fields` into the document, creating it if absent.  Top-level
    /// fields present in `fields` overwrite the stored ones; other stored
    /// fields are preserved.
    async fn set(&self, collection: &str, id: &str, fields: serde_json::Value) -> Result<()>;

    /// Delete a document.  Returns `true` if a record was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Range query: documents whose string field starts with `prefix`,
    /// matched case-insensitively.  Used for user search.
    async fn query_prefix(
        &self,
        collection: &str,
        field: &str,
        prefix: &str,
    ) -> Result<Vec<Document>>;
}
