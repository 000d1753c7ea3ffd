use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::metrics::SESSIONS_ONLINE;
use crate::types::{
    ConnectionId, Identity, MessageServer, Room, RoomId, RoomMember, RoomSnapshot, Time, UserId,
};
use crate::ServerStateInner;

/// One live connection's view of a user. Exactly one entry per user: a
/// newer connection supersedes the older one's room association, and the
/// older transport's eventual disconnect is ignored by connection id.
#[derive(Debug, Clone)]
pub struct LiveSession {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub room_id: Option<RoomId>,
    pub joined_at: Time,
}

/// The room membership table: the in-process authoritative view of which
/// live connections are where. Explicitly owned and injectable, never a
/// global. The store is persisted first on every transition; in-memory
/// state only moves after the store commits.
pub struct ServiceMembers {
    state: Arc<ServerStateInner>,
    live: DashMap<UserId, LiveSession>,
    transitions: DashMap<UserId, Arc<Mutex<()>>>,
    announces: DashMap<RoomId, Arc<Mutex<()>>>,
}

impl ServiceMembers {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self {
            state,
            live: DashMap::new(),
            transitions: DashMap::new(),
            announces: DashMap::new(),
        }
    }

    /// per-user lock serializing the whole leave+persist+join sequence.
    /// never held across nothing but the store call and the map writes.
    fn transition_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.transitions
            .entry(user_id)
            .or_default()
            .clone()
    }

    /// register a freshly authenticated connection, superseding any older
    /// one for the same user
    pub async fn connect(&self, identity: &Identity, connection_id: ConnectionId) {
        let lock = self.transition_lock(identity.user_id);
        let _guard = lock.lock().await;
        let superseded = self.live.insert(
            identity.user_id,
            LiveSession {
                connection_id,
                user_id: identity.user_id,
                room_id: None,
                joined_at: Time::now_utc(),
            },
        );
        if superseded.is_none() {
            SESSIONS_ONLINE.inc();
        }

        let s = self.state.clone();
        let user_id = identity.user_id;
        tokio::spawn(async move {
            if let Err(err) = s.data().user_set_online(user_id, true, Time::now_utc()).await {
                warn!("failed to persist online flag for {user_id}: {err}");
            }
        });
    }

    /// Join or switch rooms: one atomic transition under the per-user lock.
    /// The store commits the move first; only then do the in-memory table
    /// and the bus observe it, old room strictly before new room.
    pub async fn join(
        &self,
        identity: &Identity,
        connection_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<RoomSnapshot> {
        let lock = self.transition_lock(identity.user_id);
        let _guard = lock.lock().await;

        let srv = self.state.services();
        let room = srv.rooms.get(room_id).await?;
        let already_member = self
            .state
            .data()
            .room_member_get(room_id, identity.user_id)
            .await?
            .is_some();
        if room.is_private && !already_member {
            return Err(Error::MissingPermissions);
        }

        self.persist_and_announce(identity.user_id, Some(connection_id), Some(room_id))
            .await?;
        srv.rooms.invalidate(room_id).await;

        self.snapshot(&room).await
    }

    /// Move a user into a room without the private-room gate: invite
    /// redemption and room creation are their own admission. A live
    /// connection is told to follow via `roomChanged`.
    pub async fn force_join(&self, user_id: UserId, room_id: RoomId) -> Result<RoomSnapshot> {
        let lock = self.transition_lock(user_id);
        let _guard = lock.lock().await;

        let srv = self.state.services();
        let room = srv.rooms.get(room_id).await?;

        let origin = self.live.get(&user_id).map(|s| s.connection_id);
        self.persist_and_announce(user_id, origin, Some(room_id)).await?;
        srv.rooms.invalidate(room_id).await;

        if self.live.contains_key(&user_id) {
            self.state
                .broadcast_user(user_id, MessageServer::RoomChanged { room_id });
        }

        self.snapshot(&room).await
    }

    /// Idempotent: a repeated disconnect, or one from a superseded
    /// connection, is a no-op. In-memory cleanup always succeeds; the store
    /// write is best-effort.
    pub async fn disconnect(&self, user_id: UserId, connection_id: ConnectionId) {
        let lock = self.transition_lock(user_id);
        let _guard = lock.lock().await;

        let owned = self
            .live
            .get(&user_id)
            .is_some_and(|s| s.connection_id == connection_id);
        if !owned {
            return;
        }
        let (_, session) = self.live.remove(&user_id).expect("checked under lock");
        SESSIONS_ONLINE.dec();

        if let Some(room_id) = session.room_id {
            self.state.broadcast_room(
                room_id,
                Some(connection_id),
                MessageServer::UserLeft { room_id, user_id },
            );
            self.announce_member_list(room_id, Some(connection_id)).await;
        }

        // the connection is already gone; a failed presence write is only
        // worth a log line
        let s = self.state.clone();
        tokio::spawn(async move {
            if let Err(err) = s
                .data()
                .user_set_online(user_id, false, Time::now_utc())
                .await
            {
                warn!("failed to persist offline flag for {user_id}: {err}");
            }
        });
    }

    /// persist the membership move, then mutate the live table, then emit
    /// leave/join events in that order. callers hold the transition lock.
    async fn persist_and_announce(
        &self,
        user_id: UserId,
        origin: Option<ConnectionId>,
        to: Option<RoomId>,
    ) -> Result<()> {
        let now = Time::now_utc();
        let moved = self
            .state
            .with_store_timeout(self.state.data().room_member_move(user_id, to, now))
            .await?;

        // store committed; the live table may now follow
        if let Some(mut session) = self.live.get_mut(&user_id) {
            session.room_id = to;
        }

        if moved.from == moved.to {
            return Ok(());
        }

        if let Some(old_room) = moved.from {
            self.state.broadcast_room(
                old_room,
                origin,
                MessageServer::UserLeft {
                    room_id: old_room,
                    user_id,
                },
            );
            self.announce_member_list(old_room, origin).await;
        }

        if let Some(new_room) = moved.to {
            let member = self.member_entry(new_room, user_id).await;
            if let Some(user) = member {
                self.state.broadcast_room(
                    new_room,
                    origin,
                    MessageServer::UserJoined {
                        room_id: new_room,
                        user,
                    },
                );
            }
            self.announce_member_list(new_room, origin).await;
        }

        Ok(())
    }

    /// `membership changed` fan-out: push a refreshed list to everyone in
    /// the room. failure to read the list for the broadcast is logged, not
    /// surfaced, since the membership change itself already committed.
    ///
    /// The per-room lock spans the read and the publish: transitions by
    /// different users only hold per-user locks, so without it two list
    /// frames could hit the bus with the staler read last.
    async fn announce_member_list(&self, room_id: RoomId, origin: Option<ConnectionId>) {
        let lock = self.announces.entry(room_id).or_default().clone();
        let _guard = lock.lock().await;
        match self.list_members(room_id).await {
            Ok(users) => {
                self.state.broadcast_room(
                    room_id,
                    origin,
                    MessageServer::RoomUserList { room_id, users },
                );
            }
            Err(err) => warn!("failed to load member list for {room_id}: {err}"),
        }
    }

    async fn member_entry(&self, room_id: RoomId, user_id: UserId) -> Option<RoomMember> {
        let row = self
            .state
            .data()
            .room_member_get(room_id, user_id)
            .await
            .ok()
            .flatten()?;
        Some(RoomMember {
            user_id: row.user_id,
            display_name: row.display_name,
            online: self.is_online(row.user_id),
            joined_at: row.joined_at,
        })
    }

    /// persistent member set with live online flags, in join order
    pub async fn list_members(&self, room_id: RoomId) -> Result<Vec<RoomMember>> {
        let rows = self.state.data().room_member_list(room_id).await?;
        Ok(rows
            .into_iter()
            .map(|row| RoomMember {
                online: self.is_online(row.user_id),
                user_id: row.user_id,
                display_name: row.display_name,
                joined_at: row.joined_at,
            })
            .collect())
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.live.contains_key(&user_id)
    }

    pub fn online_count(&self, room_id: RoomId) -> usize {
        self.live
            .iter()
            .filter(|s| s.room_id == Some(room_id))
            .count()
    }

    /// the live room association, as the table currently sees it
    pub fn current_room(&self, user_id: UserId) -> Option<RoomId> {
        self.live.get(&user_id).and_then(|s| s.room_id)
    }

    async fn snapshot(&self, room: &Room) -> Result<RoomSnapshot> {
        let srv = self.state.services();
        let messages = srv.messages.history(room.id).await?;
        let members = self.list_members(room.id).await?;
        Ok(RoomSnapshot {
            room: room.clone(),
            messages,
            members,
        })
    }

    /// rebuild a snapshot for resynchronization (lagged bus receiver or an
    /// invite-driven room change)
    pub async fn resync(&self, room_id: RoomId) -> Result<RoomSnapshot> {
        let room = self.state.services().rooms.get(room_id).await?;
        self.snapshot(&room).await
    }
}
