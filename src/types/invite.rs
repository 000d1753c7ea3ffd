use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::consts::INVITE_MESSAGE_MAX;

use super::ids::{InviteId, RoomId, UserId};
use super::time::Time;

/// An unguessable token granting redemption rights into a room
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(examples("a1B2c3D4"))]
pub struct InviteCode(pub String);

impl std::fmt::Display for InviteCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteKind {
    /// anyone holding the code may redeem it
    Code,
    /// only the targeted user may redeem it
    Direct,
    /// delivered out of band to an email address
    Email,
}

impl InviteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteKind::Code => "code",
            InviteKind::Direct => "direct",
            InviteKind::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    /// usage limit reached; no longer redeemable
    Accepted,
    /// revoked by the issuer or past its expiry
    Expired,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InviteStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteTarget {
    None,
    User { user_id: UserId },
    Email { email: String },
}

/// An invitation into a room, bounded by expiry time and usage count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Invite {
    #[schema(read_only)]
    pub id: InviteId,

    pub code: InviteCode,

    pub room_id: RoomId,

    pub issued_by: UserId,

    pub kind: InviteKind,

    pub target: InviteTarget,

    pub status: InviteStatus,

    pub expires_at: Time,

    pub usage_limit: u32,

    pub used_count: u32,

    pub message: Option<String>,

    #[schema(read_only)]
    pub created_at: Time,
}

impl Invite {
    /// Expiry is a computed predicate, not just the stored status: a
    /// nominally pending invite past its deadline is already dead.
    pub fn is_expired(&self, now: Time) -> bool {
        self.status == InviteStatus::Expired || now > self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.status == InviteStatus::Accepted || self.used_count >= self.usage_limit
    }

    /// still redeemable at `now` (target checks aside)
    pub fn is_live(&self, now: Time) -> bool {
        !self.is_expired(now) && !self.is_exhausted()
    }
}

/// Data required to issue an invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct InviteCreate {
    pub kind: InviteKind,

    /// required iff kind is `direct`
    #[serde(default)]
    pub target_user_id: Option<UserId>,

    /// required iff kind is `email`
    #[serde(default)]
    pub target_email: Option<String>,

    /// clamped to [1, 168]
    #[serde(default)]
    pub expires_in_hours: Option<i64>,

    /// clamped to [1, 100]
    #[serde(default)]
    pub usage_limit: Option<u32>,

    #[serde(default)]
    #[validate(length(max = INVITE_MESSAGE_MAX))]
    pub message: Option<String>,
}

/// The unauthenticated preview of a pending, unexpired invite. Everything
/// else behind a code is a uniform not-found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvitePreview {
    pub room_name: String,
    pub room_description: Option<String>,
    pub inviter: String,
    pub expires_at: Time,
    pub uses_remaining: u32,
}
