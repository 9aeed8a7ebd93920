//! Root composition object.
//!
//! A [`Session`] owns the collaborator handles and one state holder per
//! feature.  Session-scoped facts such as the onboarding flag live here as
//! persisted document fields, not as process-wide globals.

use std::path::PathBuf;
use std::sync::Arc;

use wayfarer_backend::{
    AuthProvider, BlobStore, DocumentStore, LocalAuth, LocalBackend, LocalBlobStore, ProviderFlow,
    RedirectProviderFlow,
};
use wayfarer_shared::constants::{MAX_MEDIA_SIZE, USERS_COLLECTION};
use wayfarer_shared::{AuthError, ClientError, Result};

use crate::auth::AuthController;
use crate::chat::ChatController;
use crate::explore::ExploreController;
use crate::feed::FeedController;
use crate::people::PeopleController;
use crate::spaces::SpacesController;

pub struct Session {
    auth: Arc<AuthController>,
    feed: Arc<FeedController>,
    explore: ExploreController,
    chat: ChatController,
    spaces: Arc<SpacesController>,
    people: PeopleController,
    documents: Arc<dyn DocumentStore>,
}

impl Session {
    /// Wire a session over explicit collaborators.  The explore holder is
    /// passed in so its data source stays a constructor-time decision.
    /// Must be called from within a runtime: the feed and space holders
    /// start their live-query mirror tasks here.
    pub fn new(
        auth_provider: Arc<dyn AuthProvider>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        provider_flow: Arc<dyn ProviderFlow>,
        explore: ExploreController,
    ) -> Self {
        Self {
            auth: Arc::new(AuthController::new(
                auth_provider,
                Arc::clone(&documents),
                Arc::clone(&blobs),
                provider_flow,
            )),
            feed: FeedController::new(Arc::clone(&documents), blobs),
            explore,
            chat: ChatController::mock(),
            spaces: SpacesController::new(Arc::clone(&documents)),
            people: PeopleController::new(Arc::clone(&documents)),
            documents,
        }
    }

    /// Fully embedded session: in-memory documents and accounts, blobs under
    /// `blob_dir`, the sample destination catalogue, and the redirect-style
    /// provider flow.
    pub async fn local(blob_dir: PathBuf) -> Result<Self> {
        let backend = Arc::new(LocalBackend::in_memory().map_err(ClientError::from)?);
        let auth = Arc::new(LocalAuth::new(backend.database()));
        let blobs = Arc::new(
            LocalBlobStore::new(blob_dir, MAX_MEDIA_SIZE)
                .await
                .map_err(ClientError::from)?,
        );

        Ok(Self::new(
            auth,
            backend,
            blobs,
            Arc::new(RedirectProviderFlow),
            ExploreController::mock(),
        ))
    }

    pub fn auth(&self) -> &AuthController {
        &self.auth
    }

    pub fn feed(&self) -> &FeedController {
        &self.feed
    }

    pub fn explore(&self) -> &ExploreController {
        &self.explore
    }

    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    pub fn spaces(&self) -> &SpacesController {
        &self.spaces
    }

    pub fn people(&self) -> &PeopleController {
        &self.people
    }

    /// Whether the signed-in user has finished onboarding.  Signed-out
    /// sessions (and fresh profiles) report `false`.
    pub async fn has_completed_onboarding(&self) -> Result<bool> {
        let Some(user) = self.auth.user().get() else {
            return Ok(false);
        };
        match self.documents.get(USERS_COLLECTION, user.id.as_str()).await {
            Ok(doc) => Ok(doc
                .body
                .get("onboardingComplete")
                .and_then(|v| v.as_bool())
                .unwrap_or(false)),
            Err(wayfarer_backend::BackendError::NotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist the onboarding flag on the user's profile document.
    pub async fn complete_onboarding(&self) -> Result<()> {
        let user = self
            .auth
            .user()
            .get()
            .ok_or(ClientError::Auth(AuthError::NotSignedIn))?;

        self.documents
            .set(
                USERS_COLLECTION,
                user.id.as_str(),
                serde_json::json!({ "onboardingComplete": true }),
            )
            .await?;
        Ok(())
    }
}
