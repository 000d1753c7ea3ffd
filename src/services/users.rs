use std::sync::Arc;

use crate::error::Result;
use crate::types::{User, UserId};
use crate::ServerStateInner;

/// Thin read layer over stored users, with live online flags patched in.
pub struct ServiceUsers {
    state: Arc<ServerStateInner>,
}

impl ServiceUsers {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self { state }
    }

    pub async fn get(&self, user_id: UserId) -> Result<User> {
        let mut user = self.state.data().user_get(user_id).await?;
        user.online = self.state.services().members.is_online(user_id);
        Ok(user)
    }
}
