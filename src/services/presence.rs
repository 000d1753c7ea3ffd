use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::types::{ConnectionId, MessageServer, RoomId, UserId};
use crate::ServerStateInner;

/// How long a typing signal stays live without being refreshed.
const TYPING_TTL: Duration = Duration::from_secs(10);

/// Typing indicators: soft state, kept only in memory. An entry expires on
/// its own after ten seconds so a client that vanishes mid-keystroke never
/// leaves a stuck indicator behind.
pub struct ServicePresence {
    state: Arc<ServerStateInner>,
    typing: Cache<(RoomId, UserId), ()>,
}

impl ServicePresence {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self {
            state,
            typing: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(TYPING_TTL)
                .build(),
        }
    }

    /// flip a user's typing state in their current room and tell everyone
    /// else. the sender is not echoed; they know what their keyboard did.
    pub async fn set_typing(
        &self,
        user_id: UserId,
        origin: ConnectionId,
        room_id: RoomId,
        is_typing: bool,
    ) {
        if is_typing {
            self.typing.insert((room_id, user_id), ()).await;
        } else {
            self.typing.invalidate(&(room_id, user_id)).await;
        }

        self.state.broadcast_room(
            room_id,
            Some(origin),
            MessageServer::UserTyping {
                room_id,
                user_id,
                is_typing,
            },
        );
    }

    /// everyone currently typing in a room, for replay to a fresh joiner
    pub fn typing_users(&self, room_id: RoomId) -> Vec<UserId> {
        self.typing
            .iter()
            .filter(|(key, _)| key.0 == room_id)
            .map(|(key, _)| key.1)
            .collect()
    }

    /// drop any typing state a user left behind when they leave a room
    pub async fn clear(&self, room_id: RoomId, user_id: UserId) {
        self.typing.invalidate(&(room_id, user_id)).await;
    }
}
