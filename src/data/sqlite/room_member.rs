use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar};

use crate::consts::GENERAL_ROOM_NAME;
use crate::data::{DataRoomMember, DbRoomMember, MemberMove};
use crate::error::Result;
use crate::types::{RoomId, Time, UserId};

use super::{parse_id, Sqlite};

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: String,
    display_name: String,
    joined_at: i64,
}

impl MemberRow {
    fn into_member(self) -> Result<DbRoomMember> {
        Ok(DbRoomMember {
            user_id: parse_id(&self.user_id)?,
            display_name: self.display_name,
            joined_at: Time::from_unix(self.joined_at),
        })
    }
}

#[async_trait]
impl DataRoomMember for Sqlite {
    async fn room_member_move(
        &self,
        user_id: UserId,
        to: Option<RoomId>,
        now: Time,
    ) -> Result<MemberMove> {
        let mut tx = self.pool.begin().await?;

        let from: Option<String> =
            query_scalar("select room_id from room_members where user_id = ?")
                .bind(user_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let from: Option<RoomId> = from.as_deref().map(parse_id).transpose()?;

        match to {
            Some(to_id) => {
                // a rejoin of the same room keeps its original joined_at
                query(
                    r#"
                    insert into room_members (user_id, room_id, joined_at)
                    values (?, ?, ?)
                    on conflict (user_id) do update set
                        joined_at = case
                            when room_members.room_id = excluded.room_id then room_members.joined_at
                            else excluded.joined_at
                        end,
                        room_id = excluded.room_id
                    "#,
                )
                .bind(user_id.to_string())
                .bind(to_id.to_string())
                .bind(now.unix())
                .execute(&mut *tx)
                .await?;

                // joining an inactive room reactivates it
                query("update rooms set active = 1, last_activity_at = ? where id = ?")
                    .bind(now.unix())
                    .bind(to_id.to_string())
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                query("delete from room_members where user_id = ?")
                    .bind(user_id.to_string())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        query("update users set current_room_id = ? where id = ?")
            .bind(to.map(|id| id.to_string()))
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        if let Some(from_id) = from.filter(|f| Some(*f) != to) {
            query("update rooms set last_activity_at = ? where id = ?")
                .bind(now.unix())
                .bind(from_id.to_string())
                .execute(&mut *tx)
                .await?;

            // the general room survives emptiness; everything else deactivates
            query(
                r#"
                update rooms set active = 0
                where id = ? and name <> ?
                  and not exists (select 1 from room_members where room_id = rooms.id)
                "#,
            )
            .bind(from_id.to_string())
            .bind(GENERAL_ROOM_NAME)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(MemberMove { from, to })
    }

    async fn room_member_list(&self, room_id: RoomId) -> Result<Vec<DbRoomMember>> {
        let rows: Vec<MemberRow> = query_as(
            r#"
            select m.user_id, u.display_name, m.joined_at
            from room_members m join users u on u.id = m.user_id
            where m.room_id = ?
            order by m.joined_at, m.user_id
            "#,
        )
        .bind(room_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MemberRow::into_member).collect()
    }

    async fn room_member_get(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Option<DbRoomMember>> {
        let row: Option<MemberRow> = query_as(
            r#"
            select m.user_id, u.display_name, m.joined_at
            from room_members m join users u on u.id = m.user_id
            where m.room_id = ? and m.user_id = ?
            "#,
        )
        .bind(room_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(MemberRow::into_member).transpose()
    }
}
