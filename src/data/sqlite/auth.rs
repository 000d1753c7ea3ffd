use async_trait::async_trait;
use sqlx::{query, query_as};

use crate::data::{DataAuth, DataUser, DbUserCreate};
use crate::error::Result;
use crate::types::{Time, User, UserId};

use super::{Sqlite, UserRow};

#[async_trait]
impl DataAuth for Sqlite {
    async fn user_create(&self, create: DbUserCreate) -> Result<User> {
        query(
            r#"
            insert into users (id, display_name, current_room_id, online, last_seen_at, created_at)
            values (?, ?, null, 0, ?, ?)
            "#,
        )
        .bind(create.id.to_string())
        .bind(&create.display_name)
        .bind(create.created_at.unix())
        .bind(create.created_at.unix())
        .execute(&self.pool)
        .await?;
        self.user_get(create.id).await
    }

    async fn auth_token_insert(&self, user_id: UserId, token: &str) -> Result<()> {
        query("insert into auth_tokens (token, user_id, created_at) values (?, ?, ?)")
            .bind(token)
            .bind(user_id.to_string())
            .bind(Time::now_utc().unix())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn auth_user_by_token(&self, token: &str) -> Result<User> {
        let row: UserRow = query_as(
            r#"
            select u.* from users u
            join auth_tokens t on t.user_id = u.id
            where t.token = ?
            "#,
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        row.into_user()
    }
}
