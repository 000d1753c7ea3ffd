use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tower_http::cors::CorsLayer;

use crate::error::Error;
use crate::services::IdentityVerifier;
use crate::types::Identity;
use crate::ServerState;

/// extract the request's verified Identity from its bearer token
pub struct Auth(pub Identity);

impl FromRequestParts<Arc<ServerState>> for Auth {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        s: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        let auth: Authorization<Bearer> = parts
            .headers
            .typed_get()
            .ok_or(Error::MissingAuth)?;
        let identity = s.services().sessions.verify(auth.token()).await?;
        Ok(Self(identity))
    }
}

pub fn cors() -> CorsLayer {
    CorsLayer::very_permissive()
}
