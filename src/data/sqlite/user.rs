use async_trait::async_trait;
use sqlx::{query, query_as};

use crate::data::DataUser;
use crate::error::Result;
use crate::types::{Time, User, UserId};

use super::{Sqlite, UserRow};

#[async_trait]
impl DataUser for Sqlite {
    async fn user_get(&self, user_id: UserId) -> Result<User> {
        let row: UserRow = query_as("select * from users where id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        row.into_user()
    }

    async fn user_set_online(
        &self,
        user_id: UserId,
        online: bool,
        last_seen_at: Time,
    ) -> Result<()> {
        query("update users set online = ?, last_seen_at = ? where id = ?")
            .bind(online)
            .bind(last_seen_at.unix())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
