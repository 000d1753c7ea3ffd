use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Invite, InviteCode, InviteId, InviteStatus, InviteTarget, InviteKind, Message, MessageId,
    Room, RoomId, Time, User, UserId,
};

pub mod sqlite;

/// The durable store seam. The engine only ever talks through this trait;
/// the sqlite implementation is the default, not a requirement.
pub trait Data:
    DataRoom + DataRoomMember + DataMessage + DataInvite + DataUser + DataAuth + Send + Sync
{
}

#[derive(Debug, Clone)]
pub struct DbRoomCreate {
    pub id: RoomId,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub owner_id: Option<UserId>,
    pub created_at: Time,
}

#[derive(Debug, Clone)]
pub struct DbMessageCreate {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub created_at: Time,
}

#[derive(Debug, Clone)]
pub struct DbInviteCreate {
    pub id: InviteId,
    pub code: InviteCode,
    pub room_id: RoomId,
    pub issued_by: UserId,
    pub kind: InviteKind,
    pub target: InviteTarget,
    pub expires_at: Time,
    pub usage_limit: u32,
    pub message: Option<String>,
    pub created_at: Time,
}

#[derive(Debug, Clone)]
pub struct DbUserCreate {
    pub id: UserId,
    pub display_name: String,
    pub created_at: Time,
}

/// A persistent membership row joined with the member's display name.
/// Online flags are the live table's business, not the store's.
#[derive(Debug, Clone)]
pub struct DbRoomMember {
    pub user_id: UserId,
    pub display_name: String,
    pub joined_at: Time,
}

/// The outcome of a transactional membership move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberMove {
    pub from: Option<RoomId>,
    pub to: Option<RoomId>,
}

#[async_trait]
pub trait DataRoom {
    /// unique-name constraint is enforced here, at write time
    async fn room_create(&self, create: DbRoomCreate) -> Result<Room>;
    async fn room_get(&self, room_id: RoomId) -> Result<Room>;
    async fn room_get_by_name(&self, name: &str) -> Result<Room>;
    async fn room_list_active(&self) -> Result<Vec<Room>>;
    async fn room_count_active(&self) -> Result<i64>;
}

#[async_trait]
pub trait DataRoomMember {
    /// Move the user's single membership row to `to` (or drop it for None),
    /// updating `users.current_room_id`, room activation flags and
    /// `last_activity_at` in one transaction. The previous room is read
    /// inside the transaction so the store stays the arbiter under races.
    async fn room_member_move(
        &self,
        user_id: UserId,
        to: Option<RoomId>,
        now: Time,
    ) -> Result<MemberMove>;

    async fn room_member_list(&self, room_id: RoomId) -> Result<Vec<DbRoomMember>>;
    async fn room_member_get(&self, room_id: RoomId, user_id: UserId)
        -> Result<Option<DbRoomMember>>;
}

#[async_trait]
pub trait DataMessage {
    /// insert + bump the room's `last_activity_at` in one transaction;
    /// the returned message carries its store-assigned sequence
    async fn message_insert(&self, create: DbMessageCreate) -> Result<Message>;

    /// newest first; callers reverse for replay
    async fn message_list_last(&self, room_id: RoomId, limit: u32) -> Result<Vec<Message>>;
}

#[async_trait]
pub trait DataInvite {
    async fn invite_insert(&self, create: DbInviteCreate) -> Result<Invite>;
    async fn invite_get_by_code(&self, code: &InviteCode) -> Result<Invite>;
    async fn invite_list_room(&self, room_id: RoomId) -> Result<Vec<Invite>>;

    /// any pending, unexpired direct invite for this room + target
    async fn invite_find_pending_direct(
        &self,
        room_id: RoomId,
        target: UserId,
        now: Time,
    ) -> Result<Option<Invite>>;

    /// Conditionally consume one use: a single-statement compare-and-set
    /// that increments `used_count` (flipping status to accepted at the
    /// limit) only while the invite is pending, under its limit, and not
    /// past expiry. Returns false when the condition no longer holds.
    async fn invite_try_redeem(&self, code: &InviteCode, now: Time) -> Result<bool>;

    /// Give back a use consumed by `invite_try_redeem` when the membership
    /// move after it failed: decrements `used_count` and un-flips an
    /// `accepted` status back to pending.
    async fn invite_undo_redeem(&self, code: &InviteCode) -> Result<()>;

    async fn invite_set_status(&self, id: InviteId, status: InviteStatus) -> Result<()>;
}

#[async_trait]
pub trait DataUser {
    async fn user_get(&self, user_id: UserId) -> Result<User>;
    async fn user_set_online(&self, user_id: UserId, online: bool, last_seen_at: Time)
        -> Result<()>;
}

#[async_trait]
pub trait DataAuth {
    async fn user_create(&self, create: DbUserCreate) -> Result<User>;
    async fn auth_token_insert(&self, user_id: UserId, token: &str) -> Result<()>;

    /// resolve an opaque bearer token to its user, or NotFound
    async fn auth_user_by_token(&self, token: &str) -> Result<User>;
}
