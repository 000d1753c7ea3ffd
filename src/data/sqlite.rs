use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{
    Invite, InviteCode, InviteKind, InviteStatus, InviteTarget, Message, Room, Time, User,
};

use super::Data;

mod auth;
mod invite;
mod message;
mod room;
mod room_member;
mod user;

pub struct Sqlite {
    pub pool: SqlitePool,
}

impl Data for Sqlite {}

fn parse_id<T: From<Uuid>>(s: &str) -> Result<T> {
    Uuid::parse_str(s)
        .map(Into::into)
        .map_err(|e| Error::Store(format!("malformed id in store: {e}")))
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: String,
    name: String,
    description: Option<String>,
    is_private: bool,
    owner_id: Option<String>,
    active: bool,
    created_at: i64,
    last_activity_at: i64,
}

impl RoomRow {
    fn into_room(self) -> Result<Room> {
        Ok(Room {
            id: parse_id(&self.id)?,
            name: self.name,
            description: self.description,
            is_private: self.is_private,
            owner_id: self.owner_id.as_deref().map(parse_id).transpose()?,
            active: self.active,
            created_at: Time::from_unix(self.created_at),
            last_activity_at: Time::from_unix(self.last_activity_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    display_name: String,
    current_room_id: Option<String>,
    online: bool,
    last_seen_at: i64,
    created_at: i64,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        Ok(User {
            id: parse_id(&self.id)?,
            display_name: self.display_name,
            current_room_id: self.current_room_id.as_deref().map(parse_id).transpose()?,
            online: self.online,
            last_seen_at: Time::from_unix(self.last_seen_at),
            created_at: Time::from_unix(self.created_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    seq: i64,
    id: String,
    room_id: String,
    author_id: String,
    author_name: String,
    content: String,
    created_at: i64,
}

impl MessageRow {
    fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: parse_id(&self.id)?,
            room_id: parse_id(&self.room_id)?,
            author_id: parse_id(&self.author_id)?,
            author_name: self.author_name,
            content: self.content,
            created_at: Time::from_unix(self.created_at),
            seq: self.seq,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InviteRow {
    id: String,
    code: String,
    room_id: String,
    issued_by: String,
    kind: String,
    target_user_id: Option<String>,
    target_email: Option<String>,
    status: String,
    expires_at: i64,
    usage_limit: i64,
    used_count: i64,
    message: Option<String>,
    created_at: i64,
}

impl InviteRow {
    fn into_invite(self) -> Result<Invite> {
        let kind = match self.kind.as_str() {
            "code" => InviteKind::Code,
            "direct" => InviteKind::Direct,
            "email" => InviteKind::Email,
            other => return Err(Error::Store(format!("unknown invite kind: {other}"))),
        };
        let status = match self.status.as_str() {
            "pending" => InviteStatus::Pending,
            "accepted" => InviteStatus::Accepted,
            "expired" => InviteStatus::Expired,
            other => return Err(Error::Store(format!("unknown invite status: {other}"))),
        };
        let target = match (kind, &self.target_user_id, &self.target_email) {
            (InviteKind::Direct, Some(user_id), _) => InviteTarget::User {
                user_id: parse_id(user_id)?,
            },
            (InviteKind::Email, _, Some(email)) => InviteTarget::Email {
                email: email.clone(),
            },
            _ => InviteTarget::None,
        };
        Ok(Invite {
            id: parse_id(&self.id)?,
            code: InviteCode(self.code),
            room_id: parse_id(&self.room_id)?,
            issued_by: parse_id(&self.issued_by)?,
            kind,
            target,
            status,
            expires_at: Time::from_unix(self.expires_at),
            usage_limit: self.usage_limit as u32,
            used_count: self.used_count as u32,
            message: self.message,
            created_at: Time::from_unix(self.created_at),
        })
    }
}
