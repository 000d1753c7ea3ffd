use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{RoomId, UserId};
use super::time::Time;

/// A user, as stored and as shown to other members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(read_only)]
    pub id: UserId,

    pub display_name: String,

    /// the room this user last joined, if any
    pub current_room_id: Option<RoomId>,

    pub online: bool,

    pub last_seen_at: Time,

    #[schema(read_only)]
    pub created_at: Time,
}

/// The verified output of the identity seam: who is on the other end of a
/// connection. Never constructed from unverified input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            display_name: user.display_name.clone(),
        }
    }
}
