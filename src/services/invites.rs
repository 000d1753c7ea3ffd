use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use nanoid::nanoid;
use tokio::sync::Mutex;
use tracing::warn;

use crate::consts::{
    INVITE_EXPIRES_HOURS_MAX, INVITE_EXPIRES_HOURS_MIN, INVITE_USAGE_MAX, INVITE_USAGE_MIN,
};
use crate::data::DbInviteCreate;
use crate::error::{Error, Result};
use crate::metrics::{INVITES_ISSUED_TOTAL, INVITES_REDEEMED_TOTAL};
use crate::types::{
    Identity, Invite, InviteCode, InviteCreate, InviteId, InviteKind, InvitePreview, InviteStatus,
    InviteTarget, RoomId, RoomSnapshot, Time, UserId,
};
use crate::ServerStateInner;

/// The invitation lifecycle engine: issue, redeem, revoke, expire. All
/// mutations to one code are serialized by a keyed lock, and redemption is
/// additionally a store-level compare-and-set, so a single-use code can
/// never be consumed twice.
pub struct ServiceInvites {
    state: Arc<ServerStateInner>,
    redemptions: DashMap<String, Arc<Mutex<()>>>,
}

impl ServiceInvites {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self {
            state,
            redemptions: DashMap::new(),
        }
    }

    fn redemption_lock(&self, code: &InviteCode) -> Arc<Mutex<()>> {
        self.redemptions.entry(code.0.clone()).or_default().clone()
    }

    pub async fn issue(
        &self,
        issuer: UserId,
        room_id: RoomId,
        create: InviteCreate,
    ) -> Result<Invite> {
        use validator::Validate;
        create.validate()?;

        let data = self.state.data();
        let now = Time::now_utc();

        // only current members may invite
        if data.room_member_get(room_id, issuer).await?.is_none() {
            return Err(Error::MissingPermissions);
        }

        let expires_in_hours = create
            .expires_in_hours
            .unwrap_or(24)
            .clamp(INVITE_EXPIRES_HOURS_MIN, INVITE_EXPIRES_HOURS_MAX);
        let usage_limit = create
            .usage_limit
            .unwrap_or(1)
            .clamp(INVITE_USAGE_MIN, INVITE_USAGE_MAX);

        let target = match create.kind {
            InviteKind::Code => InviteTarget::None,
            InviteKind::Direct => {
                let target_id = create
                    .target_user_id
                    .ok_or(Error::BadStatic("direct invites need a target user"))?;
                // the target must exist...
                self.state.data().user_get(target_id).await?;
                // ...must not already be in the room...
                if data.room_member_get(room_id, target_id).await?.is_some() {
                    return Err(Error::Conflict);
                }
                // ...and must not already hold a live invite to it
                if data
                    .invite_find_pending_direct(room_id, target_id, now)
                    .await?
                    .is_some()
                {
                    return Err(Error::Conflict);
                }
                InviteTarget::User { user_id: target_id }
            }
            InviteKind::Email => {
                let email = create
                    .target_email
                    .ok_or(Error::BadStatic("email invites need a target address"))?;
                InviteTarget::Email { email }
            }
        };

        let alphabet: Vec<char> =
            "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
                .chars()
                .collect();
        let code = InviteCode(nanoid!(8, &alphabet));

        let invite = self
            .state
            .with_store_timeout(data.invite_insert(DbInviteCreate {
                id: InviteId::new(),
                code,
                room_id,
                issued_by: issuer,
                kind: create.kind,
                target,
                expires_at: now + Duration::from_secs(expires_in_hours as u64 * 3600),
                usage_limit,
                message: create.message,
                created_at: now,
            }))
            .await?;
        INVITES_ISSUED_TOTAL.inc();
        Ok(invite)
    }

    /// Redeem a code for `redeemer`. Rejections are checked in order:
    /// unknown, dead (revoked/expired), exhausted, wrong target, already a
    /// member. The increment itself is a store CAS; losing the race maps
    /// back onto the same taxonomy.
    pub async fn redeem(&self, code: &InviteCode, redeemer: &Identity) -> Result<RoomSnapshot> {
        let lock = self.redemption_lock(code);
        let _guard = lock.lock().await;

        let data = self.state.data();
        let now = Time::now_utc();
        let invite = data.invite_get_by_code(code).await?;

        if invite.is_expired(now) {
            self.persist_lazy_expiry(&invite).await;
            return Err(Error::InviteExpired);
        }
        if invite.is_exhausted() {
            return Err(Error::InviteLimitReached);
        }
        if let InviteTarget::User { user_id } = invite.target {
            if user_id != redeemer.user_id {
                return Err(Error::NotInviteTarget);
            }
        }
        if data
            .room_member_get(invite.room_id, redeemer.user_id)
            .await?
            .is_some()
        {
            return Err(Error::Conflict);
        }

        let won = self
            .state
            .with_store_timeout(data.invite_try_redeem(code, now))
            .await?;
        if !won {
            // someone else got here between our read and the CAS
            let current = data.invite_get_by_code(code).await?;
            return Err(if current.is_expired(now) {
                Error::InviteExpired
            } else {
                Error::InviteLimitReached
            });
        }
        let srv = self.state.services();
        match srv.members.force_join(redeemer.user_id, invite.room_id).await {
            Ok(snapshot) => {
                INVITES_REDEEMED_TOTAL.inc();
                Ok(snapshot)
            }
            // the use was consumed but the membership move never committed;
            // hand the use back under the code lock we still hold
            Err(err) => {
                if let Err(undo_err) = data.invite_undo_redeem(code).await {
                    warn!("failed to return a use to invite {code}: {undo_err}");
                }
                Err(err)
            }
        }
    }

    /// issuer-only; flips to expired regardless of remaining usage
    pub async fn revoke(&self, code: &InviteCode, requester: UserId) -> Result<()> {
        let lock = self.redemption_lock(code);
        let _guard = lock.lock().await;

        let data = self.state.data();
        let invite = data.invite_get_by_code(code).await?;
        if invite.issued_by != requester {
            return Err(Error::MissingPermissions);
        }
        if invite.status.is_terminal() {
            return Err(Error::Conflict);
        }
        self.state
            .with_store_timeout(data.invite_set_status(invite.id, InviteStatus::Expired))
            .await?;
        Ok(())
    }

    /// member-only listing of a room's invitations
    pub async fn list(&self, room_id: RoomId, requester: UserId) -> Result<Vec<Invite>> {
        let data = self.state.data();
        if data.room_member_get(room_id, requester).await?.is_none() {
            return Err(Error::MissingPermissions);
        }
        data.invite_list_room(room_id).await
    }

    /// Unauthenticated preview. Anything that isn't pending and unexpired
    /// is a uniform not-found so dead codes reveal nothing.
    pub async fn preview(&self, code: &InviteCode) -> Result<InvitePreview> {
        let data = self.state.data();
        let now = Time::now_utc();
        let invite = data.invite_get_by_code(code).await?;
        if !invite.is_live(now) {
            if invite.status == InviteStatus::Pending {
                self.persist_lazy_expiry(&invite).await;
            }
            return Err(Error::NotFound);
        }
        let room = self.state.services().rooms.get(invite.room_id).await?;
        let inviter = data.user_get(invite.issued_by).await?;
        Ok(InvitePreview {
            room_name: room.name,
            room_description: room.description,
            inviter: inviter.display_name,
            expires_at: invite.expires_at,
            uses_remaining: invite.usage_limit - invite.used_count,
        })
    }

    /// Expiry is detected lazily on read; flipping the stored status is an
    /// opportunistic cleanup, not a correctness requirement.
    async fn persist_lazy_expiry(&self, invite: &Invite) {
        if invite.status != InviteStatus::Pending {
            return;
        }
        if let Err(err) = self
            .state
            .data()
            .invite_set_status(invite.id, InviteStatus::Expired)
            .await
        {
            warn!("failed to persist lazy expiry for invite {}: {err}", invite.id);
        }
    }
}
