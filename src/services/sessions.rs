use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use nanoid::nanoid;

use crate::data::DbUserCreate;
use crate::error::{Error, Result};
use crate::types::{Identity, Time, User};
use crate::ServerStateInner;

/// The seam between "a string the client sent" and "a verified user".
/// Connections and extractors only see this trait; swapping the backing
/// auth scheme never touches them.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity>;
}

pub struct ServiceSessions {
    state: Arc<ServerStateInner>,
    cache_identity: Cache<String, Identity>,
}

impl ServiceSessions {
    pub fn new(state: Arc<ServerStateInner>) -> Self {
        Self {
            state,
            // short ttl: revoking a token should bite within a minute
            cache_identity: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(Duration::from_secs(60))
                .build(),
        }
    }

    /// create a user plus an opaque bearer token for them (cli tooling and
    /// tests; there is no self-serve signup)
    pub async fn mint(&self, display_name: &str) -> Result<(User, String)> {
        let data = self.state.data();
        let user = data
            .user_create(DbUserCreate {
                id: crate::types::UserId::new(),
                display_name: display_name.to_owned(),
                created_at: Time::now_utc(),
            })
            .await?;
        let token = nanoid!(32);
        data.auth_token_insert(user.id, &token).await?;
        Ok((user, token))
    }
}

#[async_trait]
impl IdentityVerifier for ServiceSessions {
    /// an unknown token is a failed login, not a missing row
    async fn verify(&self, credential: &str) -> Result<Identity> {
        let state = self.state.clone();
        let token = credential.to_owned();
        self.cache_identity
            .try_get_with(credential.to_owned(), async move {
                let user = state.data().auth_user_by_token(&token).await?;
                Ok(Identity::from(&user))
            })
            .await
            .map_err(|err: Arc<Error>| match &*err {
                Error::NotFound => Error::MissingAuth,
                other => other.fake_clone(),
            })
    }
}
