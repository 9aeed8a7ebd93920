//! Observable state containers.
//!
//! Every state holder owns its [`Observable`]s exclusively; screens only
//! `subscribe()` (or `get()`) and dispatch intents back.  Semantics are
//! replace-on-push with last write wins, matching the live-query streams the
//! values are derived from.

use tokio::sync::watch;

/// A single observable UI value over a `tokio::sync::watch` channel.
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value, notifying subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate the value in place, notifying subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Subscribe to changes.  The receiver lives as long as the screen that
    /// holds it; dropping it is the only teardown required.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

/// Unified load state for backend-derived values, replacing the ad hoc
/// loading/error triplet per state holder.
#[derive(Debug, Clone, PartialEq)]
pub enum Remote<T> {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// The most recent request succeeded.
    Ready(T),
    /// The most recent request failed; the message is user-facing text.
    Failed(String),
}

impl<T> Remote<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<wayfarer_shared::Result<T>> for Remote<T> {
    fn from(result: wayfarer_shared::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}
