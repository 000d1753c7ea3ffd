use async_trait::async_trait;
use sqlx::{query, query_as};

use crate::data::{DataInvite, DbInviteCreate};
use crate::error::Result;
use crate::types::{Invite, InviteCode, InviteId, InviteStatus, InviteTarget, RoomId, Time, UserId};

use super::{InviteRow, Sqlite};

#[async_trait]
impl DataInvite for Sqlite {
    async fn invite_insert(&self, create: DbInviteCreate) -> Result<Invite> {
        let (target_user_id, target_email) = match &create.target {
            InviteTarget::None => (None, None),
            InviteTarget::User { user_id } => (Some(user_id.to_string()), None),
            InviteTarget::Email { email } => (None, Some(email.clone())),
        };
        query(
            r#"
            insert into invitations
                (id, code, room_id, issued_by, kind, target_user_id, target_email,
                 status, expires_at, usage_limit, used_count, message, created_at)
            values (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, 0, ?, ?)
            "#,
        )
        .bind(create.id.to_string())
        .bind(&create.code.0)
        .bind(create.room_id.to_string())
        .bind(create.issued_by.to_string())
        .bind(create.kind.as_str())
        .bind(target_user_id)
        .bind(target_email)
        .bind(create.expires_at.unix())
        .bind(create.usage_limit)
        .bind(&create.message)
        .bind(create.created_at.unix())
        .execute(&self.pool)
        .await?;
        self.invite_get_by_code(&create.code).await
    }

    async fn invite_get_by_code(&self, code: &InviteCode) -> Result<Invite> {
        let row: InviteRow = query_as("select * from invitations where code = ?")
            .bind(&code.0)
            .fetch_one(&self.pool)
            .await?;
        row.into_invite()
    }

    async fn invite_list_room(&self, room_id: RoomId) -> Result<Vec<Invite>> {
        let rows: Vec<InviteRow> =
            query_as("select * from invitations where room_id = ? order by created_at desc")
                .bind(room_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(InviteRow::into_invite).collect()
    }

    async fn invite_find_pending_direct(
        &self,
        room_id: RoomId,
        target: UserId,
        now: Time,
    ) -> Result<Option<Invite>> {
        let row: Option<InviteRow> = query_as(
            r#"
            select * from invitations
            where room_id = ? and kind = 'direct' and target_user_id = ?
              and status = 'pending' and expires_at > ?
            limit 1
            "#,
        )
        .bind(room_id.to_string())
        .bind(target.to_string())
        .bind(now.unix())
        .fetch_optional(&self.pool)
        .await?;
        row.map(InviteRow::into_invite).transpose()
    }

    async fn invite_try_redeem(&self, code: &InviteCode, now: Time) -> Result<bool> {
        // The whole redeem condition lives in one statement so concurrent
        // redemptions race on the store, not on a fetch-then-mutate gap.
        let res = query(
            r#"
            update invitations set
                used_count = used_count + 1,
                status = case
                    when used_count + 1 >= usage_limit then 'accepted'
                    else status
                end
            where code = ? and status = 'pending'
              and used_count < usage_limit and expires_at > ?
            "#,
        )
        .bind(&code.0)
        .bind(now.unix())
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn invite_undo_redeem(&self, code: &InviteCode) -> Result<()> {
        query(
            r#"
            update invitations set
                used_count = used_count - 1,
                status = case when status = 'accepted' then 'pending' else status end
            where code = ? and used_count > 0
            "#,
        )
        .bind(&code.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn invite_set_status(&self, id: InviteId, status: InviteStatus) -> Result<()> {
        query("update invitations set status = ? where id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
