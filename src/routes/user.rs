use std::sync::Arc;

use axum::{extract::State, Json};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::Result;
use crate::types::User;
use crate::ServerState;

use super::util::Auth;

/// Who am I
#[utoipa::path(
    get,
    path = "/user/me",
    tags = ["user"],
    responses(
        (status = OK, description = "success", body = User),
    )
)]
async fn user_me(
    Auth(identity): Auth,
    State(s): State<Arc<ServerState>>,
) -> Result<Json<User>> {
    let user = s.services().users.get(identity.user_id).await?;
    Ok(Json(user))
}

pub fn routes() -> OpenApiRouter<Arc<ServerState>> {
    OpenApiRouter::new().routes(routes!(user_me))
}
