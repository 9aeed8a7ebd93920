//! Authentication state holder.
//!
//! Exposes "who is signed in" as observable state and translates sign-in /
//! register / provider / sign-out intents into collaborator calls.  A single
//! in-flight guard rejects a second authentication action while one is
//! already running; the phase observable is only ever cleared by the
//! terminal outcome of the call that set it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tracing::info;

use wayfarer_backend::{AuthProvider, BlobStore, DocumentStore, ProviderFlow};
use wayfarer_shared::constants::{avatar_path, MIN_PASSWORD_LEN, USERS_COLLECTION};
use wayfarer_shared::{AuthError, ClientError, Result, User};

use crate::observable::{Observable, Remote};

pub struct AuthController {
    auth: Arc<dyn AuthProvider>,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    provider_flow: Arc<dyn ProviderFlow>,
    current_user: Observable<Option<User>>,
    phase: Observable<Remote<()>>,
    busy: AtomicBool,
}

impl AuthController {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        provider_flow: Arc<dyn ProviderFlow>,
    ) -> Self {
        Self {
            auth,
            documents,
            blobs,
            provider_flow,
            current_user: Observable::new(None),
            phase: Observable::new(Remote::Idle),
            busy: AtomicBool::new(false),
        }
    }

    /// The signed-in user, `None` when signed out.  Updated before the call
    /// that changed it returns control to the UI.
    pub fn user(&self) -> &Observable<Option<User>> {
        &self.current_user
    }

    /// In-progress / error state of the most recent authentication action.
    pub fn phase(&self) -> &Observable<Remote<()>> {
        &self.phase
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "email and password are required".to_string(),
            ));
        }

        self.begin()?;
        let result = self.run_sign_in(email, password).await;
        self.settle(&result);
        result
    }

    async fn run_sign_in(&self, email: &str, password: &str) -> Result<User> {
        let user = self.auth.sign_in(email, password).await?;
        info!(user = %user.id.short(), "sign-in complete");
        self.current_user.set(Some(user.clone()));
        Ok(user)
    }

    /// Create the backend identity and its profile document, then upload the
    /// avatar (if provided) and store the resulting URL on the profile.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        avatar: Option<Bytes>,
    ) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() || display_name.trim().is_empty() {
            return Err(ClientError::Validation(
                "email, password and display name are required".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ClientError::Auth(AuthError::WeakPassword));
        }

        self.begin()?;
        let result = self.run_register(email, password, display_name, avatar).await;
        self.settle(&result);
        result
    }

    async fn run_register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        avatar: Option<Bytes>,
    ) -> Result<User> {
        let mut user = self.auth.register(email, password, display_name).await?;

        self.documents
            .set(
                USERS_COLLECTION,
                user.id.as_str(),
                serde_json::to_value(&user).map_err(|e| ClientError::Network(e.to_string()))?,
            )
            .await?;

        if let Some(bytes) = avatar {
            let path = avatar_path(user.id.as_str());
            self.blobs.upload(&path, bytes).await?;
            let url = self.blobs.download_url(&path).await?;
            self.documents
                .set(
                    USERS_COLLECTION,
                    user.id.as_str(),
                    json!({ "photoUrl": url }),
                )
                .await?;
            user.photo_url = Some(url);
        }

        info!(user = %user.id.short(), "registration complete");
        self.current_user.set(Some(user.clone()));
        Ok(user)
    }

    /// Sign in through the injected external identity provider flow.  On
    /// redirect platforms this fails fast with `UnsupportedFlow`; popup
    /// dismissal surfaces as `FlowCancelled`, a normal failure.
    pub async fn sign_in_with_provider(&self) -> Result<User> {
        self.begin()?;
        let result = self.run_provider_sign_in().await;
        self.settle(&result);
        result
    }

    async fn run_provider_sign_in(&self) -> Result<User> {
        let token = self.provider_flow.initiate().await?;
        let user = self.auth.sign_in_with_token(&token).await?;

        // First provider sign-in also materializes the profile document;
        // merge semantics keep an existing profile untouched beyond these
        // fields.
        self.documents
            .set(
                USERS_COLLECTION,
                user.id.as_str(),
                json!({
                    "id": user.id,
                    "displayName": user.display_name,
                    "email": user.email,
                    "isAnonymous": false,
                }),
            )
            .await?;

        info!(user = %user.id.short(), "provider sign-in complete");
        self.current_user.set(Some(user.clone()));
        Ok(user)
    }

    /// Sign out.  A guest identity has its backing data deleted before the
    /// session is invalidated; observable state always ends signed-out.
    pub async fn sign_out(&self) -> Result<()> {
        self.begin()?;
        let result = self.run_sign_out().await;
        self.current_user.set(None);
        self.settle(&result);
        result
    }

    async fn run_sign_out(&self) -> Result<()> {
        if let Some(user) = self.auth.current_user().or_else(|| self.current_user.get()) {
            if user.is_anonymous {
                self.documents
                    .delete(USERS_COLLECTION, user.id.as_str())
                    .await?;
                self.auth.delete_current_user().await?;
                info!(user = %user.id.short(), "guest data deleted");
            }
        }
        self.auth.sign_out().await?;
        Ok(())
    }

    fn begin(&self) -> Result<()> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::Validation(
                "an authentication operation is already in progress".to_string(),
            ));
        }
        self.phase.set(Remote::Loading);
        Ok(())
    }

    fn settle<T>(&self, result: &Result<T>) {
        match result {
            Ok(_) => self.phase.set(Remote::Ready(())),
            Err(err) => self.phase.set(Remote::Failed(err.to_string())),
        }
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::{watch, Semaphore};
    use wayfarer_backend::{
        LocalAuth, LocalBackend, LocalBlobStore, PopupProviderFlow, RedirectProviderFlow,
    };
    use wayfarer_shared::{AuthError, UserId};

    fn sample_user(anonymous: bool) -> User {
        User {
            id: UserId("user-1".to_string()),
            display_name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            is_anonymous: anonymous,
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    /// Fake auth collaborator that records call order and can park calls on
    /// a semaphore gate.
    struct ScriptedAuth {
        log: Arc<Mutex<Vec<&'static str>>>,
        gate: Option<Arc<Semaphore>>,
        user: User,
        session: watch::Sender<Option<User>>,
    }

    impl ScriptedAuth {
        fn new(user: User, gate: Option<Arc<Semaphore>>) -> (Self, Arc<Mutex<Vec<&'static str>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let (session, _) = watch::channel(Some(user.clone()));
            (
                Self {
                    log: Arc::clone(&log),
                    gate,
                    user,
                    session,
                },
                log,
            )
        }

        async fn record(&self, call: &'static str) {
            self.log.lock().unwrap().push(call);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
        }
    }

    #[async_trait]
    impl AuthProvider for ScriptedAuth {
        async fn sign_in(&self, _email: &str, _password: &str) -> wayfarer_backend::Result<User> {
            self.record("sign_in").await;
            Ok(self.user.clone())
        }

        async fn register(
            &self,
            _email: &str,
            _password: &str,
            _display_name: &str,
        ) -> wayfarer_backend::Result<User> {
            self.record("register").await;
            Ok(self.user.clone())
        }

        async fn sign_in_anonymously(&self) -> wayfarer_backend::Result<User> {
            self.record("sign_in_anonymously").await;
            Ok(self.user.clone())
        }

        async fn sign_in_with_token(&self, _token: &str) -> wayfarer_backend::Result<User> {
            self.record("sign_in_with_token").await;
            Ok(self.user.clone())
        }

        async fn sign_out(&self) -> wayfarer_backend::Result<()> {
            self.record("sign_out").await;
            Ok(())
        }

        async fn delete_current_user(&self) -> wayfarer_backend::Result<()> {
            self.record("delete_current_user").await;
            Ok(())
        }

        fn current_user(&self) -> Option<User> {
            self.session.borrow().clone()
        }

        fn watch_session(&self) -> watch::Receiver<Option<User>> {
            self.session.subscribe()
        }
    }

    async fn local_controller(flow: Arc<dyn ProviderFlow>) -> (AuthController, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = LocalBackend::in_memory().unwrap();
        let auth = LocalAuth::new(backend.database());
        let blobs = LocalBlobStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (
            AuthController::new(Arc::new(auth), Arc::new(backend), Arc::new(blobs), flow),
            dir,
        )
    }

    #[tokio::test]
    async fn register_writes_profile_and_avatar() {
        let (ctrl, _dir) = local_controller(Arc::new(RedirectProviderFlow)).await;

        let user = ctrl
            .register(
                "asha@example.com",
                "correct-horse",
                "Asha",
                Some(Bytes::from_static(b"png-bytes")),
            )
            .await
            .unwrap();

        assert_eq!(user.photo_url.as_deref(), Some(&*format!("local://avatars/{}", user.id)));
        assert_eq!(ctrl.user().get().map(|u| u.id), Some(user.id.clone()));
        assert_eq!(ctrl.phase().get(), Remote::Ready(()));

        // Profile document carries the uploaded avatar URL.
        let doc = ctrl
            .documents
            .get(USERS_COLLECTION, user.id.as_str())
            .await
            .unwrap();
        assert_eq!(doc.body["photoUrl"], format!("local://avatars/{}", user.id));
    }

    #[tokio::test]
    async fn blank_input_fails_before_any_call() {
        let (scripted, log) = ScriptedAuth::new(sample_user(false), None);
        let backend = LocalBackend::in_memory().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let blobs = LocalBlobStore::new(dir.path().to_path_buf(), 1024).await.unwrap();
        let ctrl = AuthController::new(
            Arc::new(scripted),
            Arc::new(backend),
            Arc::new(blobs),
            Arc::new(RedirectProviderFlow),
        );

        assert!(matches!(
            ctrl.sign_in("", "pw").await,
            Err(ClientError::Validation(_))
        ));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(ctrl.phase().get(), Remote::Idle);
    }

    #[tokio::test]
    async fn short_password_fails_before_any_call() {
        let (scripted, log) = ScriptedAuth::new(sample_user(false), None);
        let backend = LocalBackend::in_memory().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let blobs = LocalBlobStore::new(dir.path().to_path_buf(), 1024).await.unwrap();
        let ctrl = AuthController::new(
            Arc::new(scripted),
            Arc::new(backend),
            Arc::new(blobs),
            Arc::new(RedirectProviderFlow),
        );

        let err = ctrl
            .register("asha@example.com", "short", "Asha", None)
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Auth(AuthError::WeakPassword));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(ctrl.phase().get(), Remote::Idle);
    }

    #[tokio::test]
    async fn second_sign_in_is_rejected_while_in_flight() {
        let gate = Arc::new(Semaphore::new(0));
        let (scripted, log) = ScriptedAuth::new(sample_user(false), Some(Arc::clone(&gate)));
        let backend = LocalBackend::in_memory().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let blobs = LocalBlobStore::new(dir.path().to_path_buf(), 1024).await.unwrap();
        let ctrl = Arc::new(AuthController::new(
            Arc::new(scripted),
            Arc::new(backend),
            Arc::new(blobs),
            Arc::new(RedirectProviderFlow),
        ));

        let first = tokio::spawn({
            let ctrl = Arc::clone(&ctrl);
            async move { ctrl.sign_in("asha@example.com", "correct-horse").await }
        });

        // Wait until the first call is parked inside the collaborator.
        for _ in 0..200 {
            if log.lock().unwrap().len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(ctrl.phase().get().is_loading());

        // Second call: no backend call, flag untouched.
        let err = ctrl
            .sign_in("asha@example.com", "correct-horse")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(ctrl.phase().get().is_loading());

        gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert_eq!(ctrl.phase().get(), Remote::Ready(()));
    }

    #[tokio::test]
    async fn anonymous_sign_out_deletes_before_invalidating() {
        let (scripted, log) = ScriptedAuth::new(sample_user(true), None);
        let backend = LocalBackend::in_memory().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let blobs = LocalBlobStore::new(dir.path().to_path_buf(), 1024).await.unwrap();
        let ctrl = AuthController::new(
            Arc::new(scripted),
            Arc::new(backend),
            Arc::new(blobs),
            Arc::new(RedirectProviderFlow),
        );

        ctrl.sign_out().await.unwrap();

        let calls = log.lock().unwrap().clone();
        assert_eq!(calls, vec!["delete_current_user", "sign_out"]);
        assert!(ctrl.user().get().is_none());
    }

    #[tokio::test]
    async fn provider_flow_outcomes() {
        let (ctrl, _dir) = local_controller(Arc::new(RedirectProviderFlow)).await;
        let err = ctrl.sign_in_with_provider().await.unwrap_err();
        assert_eq!(err, ClientError::Auth(AuthError::UnsupportedFlow));
        // A failed attempt leaves the holder ready for the next one.
        assert!(matches!(ctrl.phase().get(), Remote::Failed(_)));

        let (ctrl, _dir) = local_controller(Arc::new(PopupProviderFlow::cancelling())).await;
        let err = ctrl.sign_in_with_provider().await.unwrap_err();
        assert_eq!(err, ClientError::Auth(AuthError::FlowCancelled));

        let (ctrl, _dir) = local_controller(Arc::new(PopupProviderFlow::resolving("tok"))).await;
        let user = ctrl.sign_in_with_provider().await.unwrap();
        assert_eq!(ctrl.user().get().map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn invalid_credentials_surface_as_auth_error() {
        let (ctrl, _dir) = local_controller(Arc::new(RedirectProviderFlow)).await;
        let err = ctrl.sign_in("nobody@example.com", "whatever").await.unwrap_err();
        assert_eq!(err, ClientError::Auth(AuthError::InvalidCredentials));
        assert!(matches!(ctrl.phase().get(), Remote::Failed(_)));

        // Guard is released by the terminal outcome; a retry is allowed.
        let err = ctrl.sign_in("nobody@example.com", "whatever").await.unwrap_err();
        assert_eq!(err, ClientError::Auth(AuthError::InvalidCredentials));
    }
}
