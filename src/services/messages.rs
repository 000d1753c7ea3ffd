use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::consts::{MESSAGE_HISTORY_LIMIT, MESSAGE_MAX_LEN};
use crate::data::DbMessageCreate;
use crate::error::{Error, Result};
use crate::metrics::MESSAGES_ACCEPTED_TOTAL;
use crate::types::{Identity, Message, MessageId, MessageServer, RoomId, Time};
use crate::ServerStateInner;

/// The message broadcast pipeline. The per-room accept lock pins a total
/// order per room: persistence and bus publication happen inside it, so
/// fan-out order equals acceptance order.
pub struct ServiceMessages {
    state: Arc<ServerStateInner>,
    accept: DashMap<RoomId, Arc<Mutex<()>>>,
}

impl ServiceMessages {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self {
            state,
            accept: DashMap::new(),
        }
    }

    fn accept_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        self.accept.entry(room_id).or_default().clone()
    }

    /// Validate, persist, then fan out. Validation failures have no side
    /// effects. Once the store commits the message stays committed: a
    /// failed delivery to some peer never rolls it back.
    pub async fn send(&self, author: &Identity, room_id: RoomId, text: &str) -> Result<Message> {
        let content = text.trim();
        if content.is_empty() {
            return Err(Error::BadStatic("message is empty"));
        }
        if content.chars().count() > MESSAGE_MAX_LEN {
            return Err(Error::BadStatic("message is longer than 1000 characters"));
        }

        // the live table is the authority on where the author is, not the
        // transport that delivered the send. a superseded connection's view
        // goes stale; its sends stop being accepted here.
        let srv = self.state.services();
        if srv.members.current_room(author.user_id) != Some(room_id) {
            return Err(Error::MissingPermissions);
        }

        let lock = self.accept_lock(room_id);
        let _guard = lock.lock().await;

        let message = self
            .state
            .with_store_timeout(self.state.data().message_insert(DbMessageCreate {
                id: MessageId::new(),
                room_id,
                author_id: author.user_id,
                author_name: author.display_name.clone(),
                content: content.to_owned(),
                created_at: Time::now_utc(),
            }))
            .await?;
        MESSAGES_ACCEPTED_TOTAL.inc();

        // bus publication is non-blocking; a slow peer is that peer's
        // problem, never the sender's
        self.state.broadcast_room(
            room_id,
            None,
            MessageServer::NewMessage {
                message: message.clone(),
            },
        );

        Ok(message)
    }

    /// last N persisted messages, reversed to chronological order
    pub async fn history(&self, room_id: RoomId) -> Result<Vec<Message>> {
        let mut messages = self
            .state
            .data()
            .message_list_last(room_id, MESSAGE_HISTORY_LIMIT)
            .await?;
        messages.reverse();
        Ok(messages)
    }
}
