use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{MessageId, RoomId, UserId};
use super::time::Time;

/// A chat message. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    #[schema(read_only)]
    pub id: MessageId,

    pub room_id: RoomId,

    pub author_id: UserId,

    /// denormalized so history replay doesn't fan out user lookups
    pub author_name: String,

    pub content: String,

    pub created_at: Time,

    /// store-assigned insertion sequence; ties broadcast order to
    /// acceptance order even within one timestamp
    #[schema(read_only)]
    pub seq: i64,
}
