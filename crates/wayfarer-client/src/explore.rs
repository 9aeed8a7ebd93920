//! Trip/destination browsing state holder.
//!
//! Holds a static or semi-static destination list and derives a
//! filtered view synchronously from user input.  No concurrency concerns:
//! everything operates on already-resident data; only the favorite toggle
//! optionally writes through to the backend.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use tracing::debug;

use wayfarer_backend::DocumentStore;
use wayfarer_shared::constants::DESTINATIONS_COLLECTION;
use wayfarer_shared::{Category, ClientError, Destination, DestinationId, Result};

use crate::observable::Observable;
use crate::samples;

/// Filtering is a pure function of (full list, query, category): an item
/// matches when the query is empty or a case-insensitive substring of its
/// title, description or country, AND the category rule is satisfied.
pub fn filter_destinations(
    all: &[Destination],
    query: &str,
    category: Category,
) -> Vec<Destination> {
    let needle = query.trim().to_lowercase();
    all.iter()
        .filter(|d| {
            let text_match = needle.is_empty()
                || d.title.to_lowercase().contains(&needle)
                || d.description.to_lowercase().contains(&needle)
                || d.country.to_lowercase().contains(&needle);
            text_match && d.matches_category(category)
        })
        .cloned()
        .collect()
}

/// What the explore screen renders: the active inputs plus the derived list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreView {
    pub query: String,
    pub category: Category,
    pub items: Vec<Destination>,
}

pub struct ExploreController {
    /// Present only for the backend-backed variant; favorite toggles then
    /// write through.
    documents: Option<Arc<dyn DocumentStore>>,
    all: Mutex<Vec<Destination>>,
    view: Observable<ExploreView>,
}

impl ExploreController {
    /// Mock data source: the bundled sample list, process-local only.
    pub fn mock() -> Self {
        Self::with_list(samples::destinations(), None)
    }

    /// Backend data source: starts empty; call [`Self::load`] to populate.
    pub fn with_backend(documents: Arc<dyn DocumentStore>) -> Self {
        Self::with_list(Vec::new(), Some(documents))
    }

    fn with_list(all: Vec<Destination>, documents: Option<Arc<dyn DocumentStore>>) -> Self {
        let view = Observable::new(ExploreView {
            query: String::new(),
            category: Category::All,
            items: all.clone(),
        });
        Self {
            documents,
            all: Mutex::new(all),
            view,
        }
    }

    pub fn view(&self) -> &Observable<ExploreView> {
        &self.view
    }

    /// Read the destination collection once (a snapshot, not a live query;
    /// the catalogue is semi-static).
    pub async fn load(&self) -> Result<()> {
        let documents = self
            .documents
            .as_ref()
            .ok_or_else(|| ClientError::Validation("mock source has nothing to load".to_string()))?;

        let docs = documents.list(DESTINATIONS_COLLECTION).await?;
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            items.push(doc.decode::<Destination>().map_err(ClientError::from)?);
        }

        *self.lock_all() = items;
        self.recompute();
        Ok(())
    }

    pub fn set_query(&self, query: &str) {
        self.view.update(|v| v.query = query.to_string());
        self.recompute();
    }

    pub fn set_category(&self, category: Category) {
        self.view.update(|v| v.category = category);
        self.recompute();
    }

    /// Flip the favorite flag on the id-matched item, replacing it in the
    /// list by identity.  The backend-backed variant also persists the flag.
    pub async fn toggle_favorite(&self, id: &DestinationId) -> Result<bool> {
        let now_favorite = {
            let mut all = self.lock_all();
            let item = all
                .iter_mut()
                .find(|d| &d.id == id)
                .ok_or(ClientError::NotFound)?;
            item.is_favorite = !item.is_favorite;
            item.is_favorite
        };
        self.recompute();
        debug!(destination = %id, favorite = now_favorite, "favorite toggled");

        if let Some(documents) = &self.documents {
            documents
                .set(
                    DESTINATIONS_COLLECTION,
                    id.as_str(),
                    json!({ "isFavorite": now_favorite }),
                )
                .await?;
        }
        Ok(now_favorite)
    }

    fn lock_all(&self) -> std::sync::MutexGuard<'_, Vec<Destination>> {
        self.all.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn recompute(&self) {
        let all = self.lock_all();
        self.view.update(|v| {
            v.items = filter_destinations(&all, &v.query, v.category);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wayfarer_backend::LocalBackend;

    fn ids(items: &[Destination]) -> Vec<&str> {
        items.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn query_matches_country_case_insensitively() {
        let ctrl = ExploreController::mock();
        ctrl.set_query("Kenya");

        let view = ctrl.view().get();
        let titles: Vec<_> = view.items.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Maasai Mara"]);
    }

    #[test]
    fn empty_query_filters_by_category_alone() {
        let ctrl = ExploreController::mock();
        ctrl.set_category(Category::Cultural);

        let view = ctrl.view().get();
        assert!(view
            .items
            .iter()
            .all(|d| d.matches_category(Category::Cultural)));
        assert!(view.items.iter().any(|d| d.title == "Pyramids of Giza"));
        assert!(!view.items.iter().any(|d| d.title == "Maasai Mara"));
    }

    #[test]
    fn empty_query_result_is_order_independent() {
        let all = samples::destinations();
        let mut reversed = all.clone();
        reversed.reverse();

        let mut a: Vec<String> = filter_destinations(&all, "", Category::Beach)
            .into_iter()
            .map(|d| d.id.0)
            .collect();
        let mut b: Vec<String> = filter_destinations(&reversed, "", Category::Beach)
            .into_iter()
            .map(|d| d.id.0)
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[tokio::test]
    async fn favorite_toggle_twice_is_identity() {
        let ctrl = ExploreController::mock();
        let before = ctrl.view().get().items;
        let target = before[0].clone();

        assert_eq!(
            ctrl.toggle_favorite(&target.id).await.unwrap(),
            !target.is_favorite
        );
        assert_eq!(
            ctrl.toggle_favorite(&target.id).await.unwrap(),
            target.is_favorite
        );

        let after = ctrl.view().get().items;
        assert_eq!(before.len(), after.len());
        assert_eq!(ids(&before), ids(&after));
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn unknown_destination_is_not_found() {
        let ctrl = ExploreController::mock();
        let err = ctrl
            .toggle_favorite(&DestinationId("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::NotFound);
    }

    #[tokio::test]
    async fn backend_variant_persists_favorites() {
        let backend = Arc::new(LocalBackend::in_memory().unwrap());
        for dest in samples::destinations() {
            backend
                .set(
                    DESTINATIONS_COLLECTION,
                    dest.id.as_str(),
                    serde_json::to_value(&dest).unwrap(),
                )
                .await
                .unwrap();
        }

        let ctrl = ExploreController::with_backend(Arc::clone(&backend) as Arc<dyn DocumentStore>);
        ctrl.load().await.unwrap();

        let target = ctrl.view().get().items[0].clone();
        ctrl.toggle_favorite(&target.id).await.unwrap();

        let doc = backend
            .get(DESTINATIONS_COLLECTION, target.id.as_str())
            .await
            .unwrap();
        assert_eq!(doc.body["isFavorite"], !target.is_favorite);
    }
}
