use std::sync::Arc;

use moka::future::Cache;
use validator::Validate;

use crate::data::DbRoomCreate;
use crate::error::Result;
use crate::metrics::ROOM_COUNT_ACTIVE;
use crate::types::{Room, RoomCreate, RoomId, RoomSnapshot, Time, UserId};
use crate::ServerStateInner;

pub struct ServiceRooms {
    state: Arc<ServerStateInner>,
    cache_room: Cache<RoomId, Room>,
}

impl ServiceRooms {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self {
            state,
            cache_room: Cache::builder()
                .max_capacity(100_000)
                .support_invalidation_closures()
                .build(),
        }
    }

    pub async fn get(&self, room_id: RoomId) -> Result<Room> {
        self.cache_room
            .try_get_with(room_id, self.state.data().room_get(room_id))
            .await
            .map_err(|err| err.fake_clone())
    }

    pub async fn invalidate(&self, room_id: RoomId) {
        self.cache_room.invalidate(&room_id).await;
    }

    /// Create a room and move the creator into it (the creator starts out
    /// as the sole member). Duplicate names are a conflict.
    pub async fn create(&self, create: RoomCreate, owner_id: UserId) -> Result<RoomSnapshot> {
        create.validate()?;
        let now = Time::now_utc();
        let room = self
            .state
            .with_store_timeout(self.state.data().room_create(DbRoomCreate {
                id: RoomId::new(),
                name: create.name,
                description: create.description,
                is_private: create.is_private,
                owner_id: Some(owner_id),
                created_at: now,
            }))
            .await?;

        let srv = self.state.services();
        let snapshot = srv.members.force_join(owner_id, room.id).await?;
        self.refresh_active_gauge().await;
        Ok(snapshot)
    }

    pub async fn list(&self) -> Result<Vec<Room>> {
        self.state.data().room_list_active().await
    }

    pub async fn refresh_active_gauge(&self) {
        if let Ok(count) = self.state.data().room_count_active().await {
            ROOM_COUNT_ACTIVE.set(count);
        }
    }
}
