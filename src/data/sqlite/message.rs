use async_trait::async_trait;
use sqlx::{query, query_as};

use crate::data::{DataMessage, DbMessageCreate};
use crate::error::Result;
use crate::types::{Message, RoomId};

use super::{MessageRow, Sqlite};

#[async_trait]
impl DataMessage for Sqlite {
    async fn message_insert(&self, create: DbMessageCreate) -> Result<Message> {
        let mut tx = self.pool.begin().await?;

        let res = query(
            r#"
            insert into messages (id, room_id, author_id, author_name, content, created_at)
            values (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(create.id.to_string())
        .bind(create.room_id.to_string())
        .bind(create.author_id.to_string())
        .bind(&create.author_name)
        .bind(&create.content)
        .bind(create.created_at.unix())
        .execute(&mut *tx)
        .await?;
        let seq = res.last_insert_rowid();

        query("update rooms set last_activity_at = ? where id = ?")
            .bind(create.created_at.unix())
            .bind(create.room_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Message {
            id: create.id,
            room_id: create.room_id,
            author_id: create.author_id,
            author_name: create.author_name,
            content: create.content,
            created_at: create.created_at,
            seq,
        })
    }

    async fn message_list_last(&self, room_id: RoomId, limit: u32) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = query_as(
            r#"
            select seq, id, room_id, author_id, author_name, content, created_at
            from messages
            where room_id = ?
            order by created_at desc, seq desc
            limit ?
            "#,
        )
        .bind(room_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MessageRow::into_message).collect()
    }
}
