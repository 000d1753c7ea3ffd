use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{ConnectionId, RoomId, UserId};
use super::message::Message;
use super::room::RoomMember;
use super::user::User;

/// client -> server frames
#[derive(Debug, Clone, PartialEq, Eq, ToSchema, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MessageClient {
    Hello { token: String },
    Join { room_id: RoomId },
    SwitchRoom { room_id: RoomId },
    SendMessage { text: String },
    Typing { is_typing: bool },
    Pong,
}

/// server -> client frames
#[derive(Debug, Clone, PartialEq, Eq, ToSchema, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MessageServer {
    Ready {
        user: User,
        conn: ConnectionId,
    },
    Ping,
    PreviousMessages {
        room_id: RoomId,
        messages: Vec<Message>,
    },
    NewMessage {
        message: Message,
    },
    UserJoined {
        room_id: RoomId,
        user: RoomMember,
    },
    UserLeft {
        room_id: RoomId,
        user_id: UserId,
    },
    RoomUserList {
        room_id: RoomId,
        users: Vec<RoomMember>,
    },
    UserTyping {
        room_id: RoomId,
        user_id: UserId,
        is_typing: bool,
    },
    RoomChanged {
        room_id: RoomId,
    },
    Error {
        error: String,
    },
}

type WsMessage = axum::extract::ws::Message;

impl From<MessageServer> for WsMessage {
    fn from(value: MessageServer) -> Self {
        WsMessage::text(
            serde_json::to_string(&value)
                .expect("server messages should always be able to be serialized"),
        )
    }
}
