//! # wayfarer-backend
//!
//! The backend-as-a-service collaborator surface consumed by the client
//! state holders: authentication, document database and blob storage, each
//! behind an object-safe trait so screens and tests can inject fakes.
//!
//! The crate also ships a complete embedded implementation (`LocalBackend`,
//! `LocalAuth`, `LocalBlobStore`) backed by SQLite and the filesystem.  It
//! powers mock mode and the test suite; a hosted SDK would slot in behind
//! the same traits.

pub mod auth;
pub mod blobs;
pub mod documents;
pub mod local;

mod error;

pub use auth::{AuthProvider, PopupProviderFlow, ProviderFlow, RedirectProviderFlow};
pub use blobs::{BlobStore, LocalBlobStore};
pub use documents::{Document, DocumentStore};
pub use error::{BackendError, Result};
pub use local::{LocalAuth, LocalBackend};
