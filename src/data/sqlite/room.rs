use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar};

use crate::data::{DataRoom, DbRoomCreate};
use crate::error::{Error, Result};
use crate::types::{Room, RoomId};

use super::{RoomRow, Sqlite};

#[async_trait]
impl DataRoom for Sqlite {
    async fn room_create(&self, create: DbRoomCreate) -> Result<Room> {
        let res = query(
            r#"
            insert into rooms (id, name, description, is_private, owner_id, active, created_at, last_activity_at)
            values (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(create.id.to_string())
        .bind(&create.name)
        .bind(&create.description)
        .bind(create.is_private)
        .bind(create.owner_id.map(|id| id.to_string()))
        .bind(create.created_at.unix())
        .bind(create.created_at.unix())
        .execute(&self.pool)
        .await;
        match res {
            Ok(_) => self.room_get(create.id).await,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(Error::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    async fn room_get(&self, room_id: RoomId) -> Result<Room> {
        let row: RoomRow = query_as("select * from rooms where id = ?")
            .bind(room_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        row.into_room()
    }

    async fn room_get_by_name(&self, name: &str) -> Result<Room> {
        let row: RoomRow = query_as("select * from rooms where name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        row.into_room()
    }

    async fn room_list_active(&self) -> Result<Vec<Room>> {
        let rows: Vec<RoomRow> = query_as("select * from rooms where active = 1 order by name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(RoomRow::into_room).collect()
    }

    async fn room_count_active(&self) -> Result<i64> {
        let count: i64 = query_scalar("select count(*) from rooms where active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
