//! # wayfarer-shared
//!
//! Domain records, identifiers and the error taxonomy shared by the backend
//! collaborator surface and the client state holders.  Everything in here is
//! plain immutable data: equality by field values, no behaviour beyond small
//! derived accessors.

pub mod constants;
pub mod error;
pub mod models;
pub mod types;

pub use error::{AuthError, ClientError, Result};
pub use models::*;
pub use types::*;
