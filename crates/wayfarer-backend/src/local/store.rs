//! Embedded [`DocumentStore`] over the SQLite `documents` table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use tokio::sync::broadcast;
use tracing::debug;

use crate::documents::{Document, DocumentStore};
use crate::error::{BackendError, Result};

use super::database::Database;

/// Broadcast capacity per collection.  Snapshots are whole result sets, so a
/// lagging subscriber that drops a few simply renders the next one.
const WATCH_CAPACITY: usize = 16;

/// Embedded document store.  Writes re-read the affected collection and
/// broadcast the full snapshot to every watcher (replace-on-push).
pub struct LocalBackend {
    db: Arc<Database>,
    watchers: Mutex<HashMap<String, broadcast::Sender<Vec<Document>>>>,
}

impl LocalBackend {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh in-memory backend, one per mock session or test.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(Database::in_memory()?)))
    }

    pub fn database(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    /// Current full result set for a collection, in backend order
    /// (last-updated last).
    fn snapshot(&self, collection: &str) -> Result<Vec<Document>> {
        self.db.with(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, body FROM documents
                 WHERE collection = ?1
                 ORDER BY updated_at ASC, id ASC",
            )?;

            let rows = stmt.query_map(params![collection], row_to_document)?;

            let mut docs = Vec::new();
            for row in rows {
                docs.push(row??);
            }
            Ok(docs)
        })
    }

    /// Push the current snapshot to watchers of `collection`, if any.
    fn publish(&self, collection: &str) -> Result<()> {
        let sender = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned();

        if let Some(tx) = sender {
            let snapshot = self.snapshot(collection)?;
            debug!(collection, len = snapshot.len(), "publishing snapshot");
            // No receivers is fine; the send result only signals that.
            let _ = tx.send(snapshot);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Document> {
        self.db.with(|conn| {
            conn.query_row(
                "SELECT id, body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                row_to_document,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => BackendError::NotFound,
                other => BackendError::Sqlite(other),
            })?
        })
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.snapshot(collection)
    }

    fn watch(&self, collection: &str) -> broadcast::Receiver<Vec<Document>> {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(WATCH_CAPACITY).0)
            .subscribe()
    }

    async fn set(&self, collection: &str, id: &str, fields: serde_json::Value) -> Result<()> {
        self.db.with(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(BackendError::Sqlite(other)),
                })?;

            // Merge upsert: top-level fields overwrite, others are kept.
            let body = match existing {
                Some(raw) => {
                    let mut current: serde_json::Value = serde_json::from_str(&raw)?;
                    match (current.as_object_mut(), fields.as_object()) {
                        (Some(cur), Some(new)) => {
                            for (key, value) in new {
                                cur.insert(key.clone(), value.clone());
                            }
                            current
                        }
                        _ => fields,
                    }
                }
                None => fields,
            };

            conn.execute(
                "INSERT OR REPLACE INTO documents (collection, id, body, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    collection,
                    id,
                    serde_json::to_string(&body)?,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })?;

        self.publish(collection)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let affected = self.db.with(|conn| {
            Ok(conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )?)
        })?;

        if affected > 0 {
            self.publish(collection)?;
        }
        Ok(affected > 0)
    }

    async fn query_prefix(
        &self,
        collection: &str,
        field: &str,
        prefix: &str,
    ) -> Result<Vec<Document>> {
        let needle = prefix.to_lowercase();
        let mut matches: Vec<Document> = self
            .snapshot(collection)?
            .into_iter()
            .filter(|doc| {
                doc.body
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_lowercase().starts_with(&needle))
                    .unwrap_or(false)
            })
            .collect();

        matches.sort_by(|a, b| {
            let key = |d: &Document| {
                d.body
                    .get(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_lowercase()
            };
            key(a).cmp(&key(b))
        });
        Ok(matches)
    }
}

/// Map a `rusqlite::Row` to a [`Document`].  The JSON parse error is carried
/// out through a nested `Result` so the caller can convert it.
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Document>> {
    let id: String = row.get(0)?;
    let raw: String = row.get(1)?;

    Ok(match serde_json::from_str(&raw) {
        Ok(body) => Ok(Document { id, body }),
        Err(e) => Err(BackendError::Json(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get() {
        let store = LocalBackend::in_memory().unwrap();
        store
            .set("users", "u1", json!({"displayName": "Asha"}))
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap();
        assert_eq!(doc.body["displayName"], "Asha");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = LocalBackend::in_memory().unwrap();
        assert!(matches!(
            store.get("users", "nobody").await,
            Err(BackendError::NotFound)
        ));
    }

    #[tokio::test]
    async fn set_merges_top_level_fields() {
        let store = LocalBackend::in_memory().unwrap();
        store
            .set("users", "u1", json!({"displayName": "Asha", "bio": "hi"}))
            .await
            .unwrap();
        store
            .set("users", "u1", json!({"bio": "travelling"}))
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap();
        assert_eq!(doc.body["displayName"], "Asha");
        assert_eq!(doc.body["bio"], "travelling");
    }

    #[tokio::test]
    async fn watch_pushes_full_snapshots() {
        let store = LocalBackend::in_memory().unwrap();
        let mut rx = store.watch("posts");

        store.set("posts", "p1", json!({"text": "one"})).await.unwrap();
        let snap = rx.recv().await.unwrap();
        assert_eq!(snap.len(), 1);

        store.set("posts", "p2", json!({"text": "two"})).await.unwrap();
        let snap = rx.recv().await.unwrap();
        // Replace-on-push: each broadcast is the whole result set.
        assert_eq!(snap.len(), 2);
    }

    #[tokio::test]
    async fn delete_publishes_and_reports() {
        let store = LocalBackend::in_memory().unwrap();
        store.set("posts", "p1", json!({})).await.unwrap();

        let mut rx = store.watch("posts");
        assert!(store.delete("posts", "p1").await.unwrap());
        assert!(!store.delete("posts", "p1").await.unwrap());

        let snap = rx.recv().await.unwrap();
        assert!(snap.is_empty());
    }

    #[tokio::test]
    async fn prefix_query_is_case_insensitive() {
        let store = LocalBackend::in_memory().unwrap();
        store
            .set("users", "u1", json!({"displayName": "Amina"}))
            .await
            .unwrap();
        store
            .set("users", "u2", json!({"displayName": "amir"}))
            .await
            .unwrap();
        store
            .set("users", "u3", json!({"displayName": "Brook"}))
            .await
            .unwrap();

        let hits = store.query_prefix("users", "displayName", "AM").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].body["displayName"], "Amina");
        assert_eq!(hits[1].body["displayName"], "amir");
    }
}
