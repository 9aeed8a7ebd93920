//! One-to-one chat state holder (mocked data path).
//!
//! Renders a static conversation list and per-chat message lists.  Sending
//! is deliberately unimplemented in this variant: it fails loudly instead of
//! pretending to deliver, and mutates nothing.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use wayfarer_shared::{Chat, ChatId, ChatMessage, ClientError, MessageId, Result};

use crate::observable::Observable;
use crate::samples;

pub struct ChatController {
    chats: Observable<Vec<Chat>>,
    messages: Mutex<HashMap<ChatId, Vec<ChatMessage>>>,
}

impl ChatController {
    /// Mock data source: bundled sample conversations.
    pub fn mock() -> Self {
        let (chats, messages) = samples::chats();
        Self {
            chats: Observable::new(chats),
            messages: Mutex::new(messages),
        }
    }

    /// Conversation list with unread counts.
    pub fn chats(&self) -> &Observable<Vec<Chat>> {
        &self.chats
    }

    /// Messages of one conversation, oldest first.
    pub fn messages(&self, chat_id: &ChatId) -> Result<Vec<ChatMessage>> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(chat_id)
            .cloned()
            .ok_or(ClientError::NotFound)
    }

    /// Explicit read action: the only thing that decreases an unread count.
    pub fn mark_read(&self, chat_id: &ChatId) -> Result<()> {
        let mut found = false;
        self.chats.update(|chats| {
            if let Some(chat) = chats.iter_mut().find(|c| &c.id == chat_id) {
                chat.unread_count = 0;
                found = true;
            }
        });
        if found {
            Ok(())
        } else {
            Err(ClientError::NotFound)
        }
    }

    /// Sending does not persist anywhere in the mocked variant.
    pub fn send(&self, _chat_id: &ChatId, _text: &str) -> Result<MessageId> {
        Err(ClientError::Validation(
            "sending is not available in mock mode".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_chats_have_messages() {
        let ctrl = ChatController::mock();
        let chats = ctrl.chats().get();
        assert!(!chats.is_empty());

        let msgs = ctrl.messages(&chats[0].id).unwrap();
        assert!(!msgs.is_empty());
        // Oldest first.
        assert!(msgs.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    }

    #[test]
    fn unknown_chat_is_not_found() {
        let ctrl = ChatController::mock();
        let missing = ChatId("missing".to_string());
        assert_eq!(ctrl.messages(&missing).unwrap_err(), ClientError::NotFound);
        assert_eq!(ctrl.mark_read(&missing).unwrap_err(), ClientError::NotFound);
    }

    #[test]
    fn mark_read_zeroes_unread() {
        let ctrl = ChatController::mock();
        let target = ctrl
            .chats()
            .get()
            .into_iter()
            .find(|c| c.unread_count > 0)
            .expect("samples include an unread chat");

        ctrl.mark_read(&target.id).unwrap();
        let after = ctrl.chats().get();
        assert_eq!(
            after.iter().find(|c| c.id == target.id).unwrap().unread_count,
            0
        );
    }

    #[test]
    fn send_fails_and_mutates_nothing() {
        let ctrl = ChatController::mock();
        let chats = ctrl.chats().get();
        let before = ctrl.messages(&chats[0].id).unwrap();

        let err = ctrl.send(&chats[0].id, "hello").unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        assert_eq!(ctrl.messages(&chats[0].id).unwrap(), before);
        assert_eq!(ctrl.chats().get(), chats);
    }
}
