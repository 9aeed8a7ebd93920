//! Spaces (communities) state holder: backend-streamed message lists.
//!
//! The space list and each opened space's messages mirror live collection
//! queries.  Sending appends a document; the observable list updates when
//! the backend pushes the new snapshot, never by local insertion.  No
//! delivery receipts, ordering reconciliation or offline queue.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use wayfarer_backend::{Document, DocumentStore};
use wayfarer_shared::constants::{space_messages_collection, SPACES_COLLECTION};
use wayfarer_shared::{ClientError, MessageId, Result, Space, SpaceId, SpaceMessage, User};

use crate::observable::{Observable, Remote};

pub struct SpacesController {
    documents: Arc<dyn DocumentStore>,
    spaces: Observable<Remote<Vec<Space>>>,
}

impl SpacesController {
    /// Subscribe to the space collection.  Must be called from within a
    /// runtime; the forwarding task ends when the controller is dropped.
    pub fn new(documents: Arc<dyn DocumentStore>) -> Arc<Self> {
        let ctrl = Arc::new(Self {
            documents,
            spaces: Observable::new(Remote::Loading),
        });

        spawn_stream::<_, Space>(
            &ctrl,
            Arc::clone(&ctrl.documents),
            SPACES_COLLECTION.to_string(),
            |ctrl| &ctrl.spaces,
        );

        ctrl
    }

    pub fn spaces(&self) -> &Observable<Remote<Vec<Space>>> {
        &self.spaces
    }

    /// Open one space's message stream.
    pub fn open(&self, space_id: SpaceId) -> Arc<SpaceThread> {
        SpaceThread::open(Arc::clone(&self.documents), space_id)
    }
}

/// A single opened space: its live message list plus the send intent.
pub struct SpaceThread {
    documents: Arc<dyn DocumentStore>,
    space_id: SpaceId,
    messages: Observable<Remote<Vec<SpaceMessage>>>,
}

impl SpaceThread {
    pub fn open(documents: Arc<dyn DocumentStore>, space_id: SpaceId) -> Arc<Self> {
        let thread = Arc::new(Self {
            documents,
            space_id,
            messages: Observable::new(Remote::Loading),
        });

        let collection = space_messages_collection(thread.space_id.as_str());
        spawn_stream::<_, SpaceMessage>(
            &thread,
            Arc::clone(&thread.documents),
            collection,
            |thread| &thread.messages,
        );

        thread
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    /// Messages in backend order.
    pub fn messages(&self) -> &Observable<Remote<Vec<SpaceMessage>>> {
        &self.messages
    }

    /// Append a message document.  The local list is not touched; the next
    /// backend push carries it.
    pub async fn send(&self, sender: &User, text: &str) -> Result<MessageId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::Validation("a message needs text".to_string()));
        }

        let message = SpaceMessage {
            id: MessageId::new(),
            space_id: self.space_id.clone(),
            sender_id: sender.id.clone(),
            sender_name: sender.display_name.clone(),
            text: text.to_string(),
            sent_at: Utc::now(),
        };

        let collection = space_messages_collection(self.space_id.as_str());
        self.documents
            .set(
                &collection,
                message.id.as_str(),
                serde_json::to_value(&message).map_err(|e| ClientError::Network(e.to_string()))?,
            )
            .await?;

        info!(space = %self.space_id, message = %message.id, "space message sent");
        Ok(message.id)
    }
}

/// Mirror a collection into an observable.  The initial read and the push
/// loop run in one task so a slow read can never land after a newer push;
/// the task ends when the owner is dropped or the stream closes.
fn spawn_stream<O, T>(
    owner: &Arc<O>,
    documents: Arc<dyn DocumentStore>,
    collection: String,
    target: impl Fn(&O) -> &Observable<Remote<Vec<T>>> + Send + 'static,
) where
    O: Send + Sync + 'static,
    T: serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
{
    let mut rx = documents.watch(&collection);
    let weak = Arc::downgrade(owner);
    tokio::spawn(async move {
        if let Some(owner) = weak.upgrade() {
            match documents.list(&collection).await {
                Ok(snapshot) => target(&owner).set(decode_all::<T>(snapshot)),
                Err(err) => target(&owner).set(Remote::Failed(err.to_string())),
            }
        }
        loop {
            match rx.recv().await {
                Ok(snapshot) => match weak.upgrade() {
                    Some(owner) => target(&owner).set(decode_all::<T>(snapshot)),
                    None => break,
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "space watcher lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn decode_all<T: serde::de::DeserializeOwned>(snapshot: Vec<Document>) -> Remote<Vec<T>> {
    let mut items = Vec::with_capacity(snapshot.len());
    for doc in snapshot {
        match doc.decode::<T>() {
            Ok(item) => items.push(item),
            Err(err) => return Remote::Failed(err.to_string()),
        }
    }
    Remote::Ready(items)
}
