use thiserror::Error;

/// Top-level error surfaced by state holders to screens.
///
/// Screens render `to_string()` as user-facing text; there is no structured
/// error code beyond the variant itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Bad or missing user input, caught before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication failure reported by the auth collaborator.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Generic backend failure, carrying whatever message the collaborator
    /// provided.
    #[error("Network error: {0}")]
    Network(String),

    /// The requested record does not exist.
    #[error("Record not found")]
    NotFound,
}

/// Authentication failure kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address is already in use")]
    EmailAlreadyInUse,

    #[error("Password does not meet the minimum strength requirements")]
    WeakPassword,

    #[error("Sign-in flow was cancelled")]
    FlowCancelled,

    #[error("Sign-in flow must be initiated by the UI on this platform")]
    UnsupportedFlow,

    #[error("No user is currently signed in")]
    NotSignedIn,
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ClientError>;
