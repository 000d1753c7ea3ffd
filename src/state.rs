use std::ops::Deref;
use std::sync::{Arc, Weak};

use sqlx::SqlitePool;
use tokio::sync::broadcast::{self, Receiver, Sender};

use crate::config::Config;
use crate::data::{sqlite::Sqlite, Data};
use crate::services::Services;
use crate::types::{ConnectionId, MessageServer, RoomId, UserId};

/// Internal broadcast envelope: one frame plus the scope it fans out to.
/// Connections subscribe to everything and filter; the single channel is
/// what gives per-room events a total order.
#[derive(Debug, Clone)]
pub enum Broadcast {
    /// goes to every live member of the room. presence-flavored frames are
    /// not echoed back to the originating connection
    Room {
        room_id: RoomId,
        origin: Option<ConnectionId>,
        msg: MessageServer,
    },
    /// goes to the user's live connection only
    User { user_id: UserId, msg: MessageServer },
}

pub struct ServerStateInner {
    pub config: Config,
    pub pool: SqlitePool,
    pub services: Weak<Services>,
    events: Sender<Broadcast>,
}

pub struct ServerState {
    pub inner: Arc<ServerStateInner>,
    pub services: Arc<Services>,
}

impl ServerStateInner {
    pub fn data(&self) -> Box<dyn Data> {
        Box::new(Sqlite {
            pool: self.pool.clone(),
        })
    }

    pub fn services(&self) -> Arc<Services> {
        self.services
            .upgrade()
            .expect("services should always exist while serverstateinner is alive")
    }

    /// emit a frame to everyone in a room
    pub fn broadcast_room(
        &self,
        room_id: RoomId,
        origin: Option<ConnectionId>,
        msg: MessageServer,
    ) {
        // no receivers just means nobody is connected
        let _ = self.events.send(Broadcast::Room {
            room_id,
            origin,
            msg,
        });
    }

    /// emit a frame to a single user's live connection
    pub fn broadcast_user(&self, user_id: UserId, msg: MessageServer) {
        let _ = self.events.send(Broadcast::User { user_id, msg });
    }

    pub fn subscribe(&self) -> Receiver<Broadcast> {
        self.events.subscribe()
    }

    /// run a store call under the configured deadline; a miss surfaces as a
    /// retryable error instead of hanging the connection task
    pub async fn with_store_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = crate::Result<T>>,
    ) -> crate::Result<T> {
        match tokio::time::timeout(self.config.store_timeout(), fut).await {
            Ok(res) => res,
            Err(_) => Err(crate::Error::StoreTimeout),
        }
    }
}

impl ServerState {
    pub fn init(config: Config, pool: SqlitePool) -> Self {
        let services = Arc::new_cyclic(|weak| {
            let inner = Arc::new(ServerStateInner {
                config,
                pool,
                services: weak.to_owned(),
                events: broadcast::channel(256).0,
            });
            Services::new(inner)
        });
        Self {
            inner: services.state.clone(),
            services,
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn data(&self) -> Box<dyn Data> {
        self.inner.data()
    }
}

impl Deref for ServerState {
    type Target = ServerStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
