//! Authentication collaborator surface.

use async_trait::async_trait;
use tokio::sync::watch;
use wayfarer_shared::{AuthError, User};

use crate::error::Result;

/// Authentication collaborator.
///
/// The session is exposed as a watch stream of `Option<User>`: `Some` while
/// signed in, `None` after sign-out.  Implementations update the stream
/// before returning from the call that changed the session.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<User>;

    /// Create a new account and sign it in.
    async fn register(&self, email: &str, password: &str, display_name: &str) -> Result<User>;

    /// Sign in as an anonymous guest.  The returned id stays stable if the
    /// guest later upgrades to a permanent account.
    async fn sign_in_anonymously(&self) -> Result<User>;

    /// Exchange an external identity provider token for a session.
    async fn sign_in_with_token(&self, token: &str) -> Result<User>;

    /// Invalidate the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Delete the currently signed-in user's backing account data.  Does not
    /// invalidate the session; callers sequence an explicit sign-out after.
    async fn delete_current_user(&self) -> Result<()>;

    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<User>;

    /// Observe session changes.
    fn watch_session(&self) -> watch::Receiver<Option<User>>;
}

/// External identity provider flow, selected per platform at construction
/// time by dependency injection.
#[async_trait]
pub trait ProviderFlow: Send + Sync {
    /// Run the provider's interactive flow and resolve its token.
    async fn initiate(&self) -> std::result::Result<String, AuthError>;
}

/// Redirect-style flow.  On this platform the interactive part is owned by
/// the UI shell; invoking it from a state holder fails fast.
#[derive(Debug, Default)]
pub struct RedirectProviderFlow;

#[async_trait]
impl ProviderFlow for RedirectProviderFlow {
    async fn initiate(&self) -> std::result::Result<String, AuthError> {
        Err(AuthError::UnsupportedFlow)
    }
}

/// Popup-style flow: opens an interactive window and resolves when the user
/// completes or dismisses it.  The embedded variant is configured with its
/// outcome up front.
#[derive(Debug)]
pub struct PopupProviderFlow {
    outcome: Option<String>,
}

impl PopupProviderFlow {
    /// A popup that the user completes, yielding `token`.
    pub fn resolving(token: impl Into<String>) -> Self {
        Self {
            outcome: Some(token.into()),
        }
    }

    /// A popup that the user dismisses.
    pub fn cancelling() -> Self {
        Self { outcome: None }
    }
}

#[async_trait]
impl ProviderFlow for PopupProviderFlow {
    async fn initiate(&self) -> std::result::Result<String, AuthError> {
        match &self.outcome {
            Some(token) => Ok(token.clone()),
            // Dismissal is a normal failure, not a crash.
            None => Err(AuthError::FlowCancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn redirect_flow_fails_fast() {
        let flow = RedirectProviderFlow;
        assert_eq!(flow.initiate().await, Err(AuthError::UnsupportedFlow));
    }

    #[tokio::test]
    async fn popup_flow_resolves_or_cancels() {
        let ok = PopupProviderFlow::resolving("tok-123");
        assert_eq!(ok.initiate().await.as_deref(), Ok("tok-123"));

        let cancelled = PopupProviderFlow::cancelling();
        assert_eq!(cancelled.initiate().await, Err(AuthError::FlowCancelled));
    }
}
