use std::sync::Arc;

use crate::ServerStateInner;

mod invites;
mod members;
mod messages;
mod presence;
mod rooms;
mod sessions;
mod users;

pub use invites::ServiceInvites;
pub use members::{LiveSession, ServiceMembers};
pub use messages::ServiceMessages;
pub use presence::ServicePresence;
pub use rooms::ServiceRooms;
pub use sessions::{IdentityVerifier, ServiceSessions};
pub use users::ServiceUsers;

/// Everything stateful the engine runs on. Each service owns its own
/// caches and locks; they reach each other through `state.services()`.
pub struct Services {
    pub state: Arc<ServerStateInner>,
    pub rooms: ServiceRooms,
    pub members: ServiceMembers,
    pub messages: ServiceMessages,
    pub invites: ServiceInvites,
    pub presence: ServicePresence,
    pub sessions: ServiceSessions,
    pub users: ServiceUsers,
}

impl Services {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self {
            rooms: ServiceRooms::new(state.clone()),
            members: ServiceMembers::new(state.clone()),
            messages: ServiceMessages::new(state.clone()),
            invites: ServiceInvites::new(state.clone()),
            presence: ServicePresence::new(state.clone()),
            sessions: ServiceSessions::new(state.clone()),
            users: ServiceUsers::new(state.clone()),
            state,
        }
    }
}
