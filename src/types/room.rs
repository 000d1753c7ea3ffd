use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::consts::{ROOM_DESCRIPTION_MAX, ROOM_NAME_MAX, ROOM_NAME_MIN};

use super::ids::{RoomId, UserId};
use super::message::Message;
use super::time::Time;

/// A room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Room {
    /// A unique identifier for this room
    #[schema(read_only)]
    pub id: RoomId,

    /// Unique within the server, 3-30 chars of `[A-Za-z0-9 _-]`
    pub name: String,

    pub description: Option<String>,

    /// Private rooms admit only existing members; everyone else needs an invite
    pub is_private: bool,

    /// The "general" room has no owner
    pub owner_id: Option<UserId>,

    /// Inactive rooms are hidden from listings until someone joins again
    #[schema(read_only)]
    pub active: bool,

    #[schema(read_only)]
    pub created_at: Time,

    #[schema(read_only)]
    pub last_activity_at: Time,
}

/// Data required to create a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct RoomCreate {
    #[schema(write_only)]
    #[validate(
        length(min = ROOM_NAME_MIN, max = ROOM_NAME_MAX),
        custom(function = validate_room_name)
    )]
    pub name: String,

    #[schema(write_only, required = false)]
    #[validate(length(max = ROOM_DESCRIPTION_MAX))]
    pub description: Option<String>,

    #[serde(default)]
    pub is_private: bool,
}

fn validate_room_name(name: &str) -> Result<(), ValidationError> {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("room_name_charset"))
    }
}

/// A room member as seen in member lists, with live presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoomMember {
    pub user_id: UserId,
    pub display_name: String,
    pub online: bool,
    pub joined_at: Time,
}

/// What a freshly joined (or invited) session receives about its room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoomSnapshot {
    pub room: Room,

    /// last N messages in chronological order
    pub messages: Vec<Message>,

    pub members: Vec<RoomMember>,
}
