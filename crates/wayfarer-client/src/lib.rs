//! # wayfarer-client
//!
//! Per-feature state holders for the Wayfarer travel-and-social client.
//! Each holder mediates between the backend collaborators and one screen:
//! it issues reads/writes, exposes observable UI state, and applies the
//! small local transformations (filter, shuffle, toggle) the screens need.
//! Screens subscribe and dispatch intents; they never own state.

pub mod auth;
pub mod chat;
pub mod explore;
pub mod feed;
pub mod observable;
pub mod people;
pub mod samples;
pub mod session;
pub mod spaces;

pub use auth::AuthController;
pub use chat::ChatController;
pub use explore::{filter_destinations, ExploreController, ExploreView};
pub use feed::{FeedController, NewPost, UploadPhase};
pub use observable::{Observable, Remote};
pub use people::PeopleController;
pub use session::Session;
pub use spaces::{SpaceThread, SpacesController};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the diagnostic subscriber.  Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wayfarer_client=debug,wayfarer_backend=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
