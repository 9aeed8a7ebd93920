//! User search and profile updates.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use wayfarer_backend::DocumentStore;
use wayfarer_shared::constants::USERS_COLLECTION;
use wayfarer_shared::{ClientError, Result, User, UserId};

use crate::observable::{Observable, Remote};

pub struct PeopleController {
    documents: Arc<dyn DocumentStore>,
    results: Observable<Remote<Vec<User>>>,
}

impl PeopleController {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            results: Observable::new(Remote::Idle),
        }
    }

    pub fn results(&self) -> &Observable<Remote<Vec<User>>> {
        &self.results
    }

    /// Prefix search over display names.  An empty prefix short-circuits to
    /// an empty result without touching the backend.
    pub async fn search(&self, prefix: &str) -> Result<Vec<User>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            self.results.set(Remote::Ready(Vec::new()));
            return Ok(Vec::new());
        }

        self.results.set(Remote::Loading);
        let outcome = self.run_search(prefix).await;
        match &outcome {
            Ok(users) => self.results.set(Remote::Ready(users.clone())),
            Err(err) => self.results.set(Remote::Failed(err.to_string())),
        }
        outcome
    }

    async fn run_search(&self, prefix: &str) -> Result<Vec<User>> {
        let docs = self
            .documents
            .query_prefix(USERS_COLLECTION, "displayName", prefix)
            .await?;

        let mut users = Vec::with_capacity(docs.len());
        for doc in docs {
            users.push(doc.decode::<User>().map_err(ClientError::from)?);
        }
        debug!(prefix, hits = users.len(), "user search complete");
        Ok(users)
    }

    /// Merge profile fields onto the user's document.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<()> {
        let mut fields = serde_json::Map::new();
        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            fields.insert("displayName".to_string(), json!(name));
        }
        if let Some(url) = photo_url {
            fields.insert("photoUrl".to_string(), json!(url));
        }
        if fields.is_empty() {
            return Err(ClientError::Validation("nothing to update".to_string()));
        }

        self.documents
            .set(USERS_COLLECTION, user_id.as_str(), fields.into())
            .await?;
        Ok(())
    }
}
