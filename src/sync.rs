use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use tokio::time::Instant;
use tracing::trace;

use crate::error::{Error, Result};
use crate::services::IdentityVerifier;
use crate::state::Broadcast;
use crate::types::{ConnectionId, Identity, MessageClient, MessageServer, RoomId, RoomSnapshot};
use crate::ServerState;

pub const HEARTBEAT_TIME: Duration = Duration::from_secs(30);
pub const CLOSE_TIME: Duration = Duration::from_secs(10);
const MAX_QUEUE_LEN: usize = 256;

pub enum Timeout {
    Ping(Instant),
    Close(Instant),
}

/// One websocket session. Owns the outbound queue and the connection's own
/// view of which room it is in; the membership table is the authority, this
/// is the filter the bus is applied through.
pub struct Connection {
    state: ConnectionState,
    s: Arc<ServerState>,
    id: ConnectionId,
    room_id: Option<RoomId>,
    queue: VecDeque<MessageServer>,
}

enum ConnectionState {
    Unauthed,
    Authenticated { identity: Identity },
}

impl Connection {
    pub fn new(s: Arc<ServerState>) -> Self {
        Self {
            state: ConnectionState::Unauthed,
            s,
            id: ConnectionId::new(),
            room_id: None,
            queue: VecDeque::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    fn identity(&self) -> Result<&Identity> {
        match &self.state {
            ConnectionState::Unauthed => Err(Error::UnauthSession),
            ConnectionState::Authenticated { identity } => Ok(identity),
        }
    }

    pub async fn handle_message(
        &mut self,
        ws_msg: Message,
        ws: &mut WebSocket,
        timeout: &mut Timeout,
    ) -> Result<()> {
        let msg = match ws_msg {
            Message::Text(utf8_bytes) => serde_json::from_str::<MessageClient>(&utf8_bytes)?,
            _ => return Ok(()),
        };
        self.handle_message_client(msg, ws, timeout).await
    }

    #[tracing::instrument(level = "debug", skip(self, ws, timeout), fields(id = %self.id))]
    async fn handle_message_client(
        &mut self,
        msg: MessageClient,
        ws: &mut WebSocket,
        timeout: &mut Timeout,
    ) -> Result<()> {
        trace!("{:#?}", msg);
        match msg {
            MessageClient::Hello { token } => {
                if let ConnectionState::Authenticated { .. } = self.state {
                    return Err(Error::BadStatic("already authenticated"));
                }

                let srv = self.s.services();
                let identity = srv.sessions.verify(&token).await?;
                srv.members.connect(&identity, self.id).await;

                let user = srv.users.get(identity.user_id).await?;
                ws.send(
                    MessageServer::Ready {
                        user,
                        conn: self.id,
                    }
                    .into(),
                )
                .await?;

                self.state = ConnectionState::Authenticated { identity };
            }
            // a join and a switch are the same transition; the split only
            // exists so clients can be explicit about intent
            MessageClient::Join { room_id } | MessageClient::SwitchRoom { room_id } => {
                let identity = self.identity()?.clone();
                let srv = self.s.services();
                let snapshot = srv.members.join(&identity, self.id, room_id).await?;
                self.enter_room(snapshot);
            }
            MessageClient::SendMessage { text } => {
                let identity = self.identity()?.clone();
                let room_id = self
                    .room_id
                    .ok_or(Error::BadStatic("join a room before sending messages"))?;
                // the accepted message comes back through the bus with no
                // origin, so the sender sees it in room order like everyone
                let srv = self.s.services();
                srv.messages.send(&identity, room_id, &text).await?;
            }
            MessageClient::Typing { is_typing } => {
                let identity = self.identity()?.clone();
                let Some(room_id) = self.room_id else {
                    return Ok(());
                };
                let srv = self.s.services();
                srv.presence
                    .set_typing(identity.user_id, self.id, room_id, is_typing)
                    .await;
            }
            MessageClient::Pong => {
                self.identity()?;
                *timeout = Timeout::for_ping();
            }
        }
        Ok(())
    }

    /// Apply one bus event to this connection: drop what is out of scope,
    /// queue what isn't. Presence-flavored frames carry their origin and
    /// are never echoed back to it.
    pub async fn queue_message(&mut self, broadcast: Broadcast) -> Result<()> {
        let user_id = match self.identity() {
            Ok(identity) => identity.user_id,
            Err(_) => return Ok(()),
        };

        match broadcast {
            Broadcast::Room {
                room_id,
                origin,
                msg,
            } => {
                if self.room_id != Some(room_id) {
                    return Ok(());
                }
                if origin == Some(self.id) {
                    return Ok(());
                }
                self.push(msg);
            }
            Broadcast::User { user_id: to, msg } => {
                if to != user_id {
                    return Ok(());
                }
                // an out-of-band move (invite redemption on the rest api):
                // follow it, then rebuild local state from a fresh snapshot.
                // enter_room re-emits the roomChanged frame itself.
                if let MessageServer::RoomChanged { room_id } = msg {
                    let snapshot = self.s.services().members.resync(room_id).await?;
                    self.enter_room(snapshot);
                } else {
                    self.push(msg);
                }
            }
        }
        Ok(())
    }

    /// full state rebuild after the bus receiver lagged
    pub async fn resync(&mut self) -> Result<()> {
        let Some(room_id) = self.room_id else {
            return Ok(());
        };
        let snapshot = self.s.services().members.resync(room_id).await?;
        self.enter_room(snapshot);
        Ok(())
    }

    /// adopt a room snapshot: history replay, then the member list, then
    /// whoever is mid-keystroke right now
    fn enter_room(&mut self, snapshot: RoomSnapshot) {
        let room_id = snapshot.room.id;
        self.room_id = Some(room_id);
        self.push(MessageServer::RoomChanged { room_id });
        self.push(MessageServer::PreviousMessages {
            room_id,
            messages: snapshot.messages,
        });
        self.push(MessageServer::RoomUserList {
            room_id,
            users: snapshot.members,
        });

        let me = match &self.state {
            ConnectionState::Authenticated { identity } => Some(identity.user_id),
            ConnectionState::Unauthed => None,
        };
        let typing = self.s.services().presence.typing_users(room_id);
        for user_id in typing {
            if Some(user_id) == me {
                continue;
            }
            self.push(MessageServer::UserTyping {
                room_id,
                user_id,
                is_typing: true,
            });
        }
    }

    fn push(&mut self, msg: MessageServer) {
        self.queue.push_back(msg);
        if self.queue.len() > MAX_QUEUE_LEN {
            self.queue.pop_front();
        }
    }

    pub async fn drain(&mut self, ws: &mut WebSocket) -> Result<()> {
        while let Some(msg) = self.queue.pop_front() {
            ws.send(msg.into()).await?;
        }
        Ok(())
    }

    /// tear down this connection's live state. safe to call when the user
    /// already reconnected elsewhere; the table checks ownership by id.
    pub async fn disconnect(&mut self) {
        let ConnectionState::Authenticated { identity } = &self.state else {
            return;
        };
        let srv = self.s.services();
        if let Some(room_id) = self.room_id {
            srv.presence.clear(room_id, identity.user_id).await;
        }
        srv.members.disconnect(identity.user_id, self.id).await;
        self.state = ConnectionState::Unauthed;
    }
}

impl Timeout {
    pub fn for_ping() -> Self {
        Timeout::Ping(Instant::now() + HEARTBEAT_TIME)
    }

    pub fn for_close() -> Self {
        Timeout::Close(Instant::now() + CLOSE_TIME)
    }

    pub fn get_instant(&self) -> Instant {
        match self {
            Timeout::Ping(instant) => *instant,
            Timeout::Close(instant) => *instant,
        }
    }
}
