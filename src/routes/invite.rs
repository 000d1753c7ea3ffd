use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::Result;
use crate::types::{Invite, InviteCode, InviteCreate, InvitePreview, RoomId, RoomSnapshot};
use crate::ServerState;

use super::util::Auth;

/// Create an invite
///
/// Issue an invitation to a room you are a member of. Expiry and usage
/// limits outside the allowed ranges are clamped, not rejected.
#[utoipa::path(
    post,
    path = "/room/{room_id}/invite",
    tags = ["invite"],
    params(("room_id", description = "Room id")),
    responses(
        (status = CREATED, description = "invite created", body = Invite),
        (status = FORBIDDEN, description = "not a member of this room"),
        (status = CONFLICT, description = "target already a member or already invited"),
    )
)]
async fn invite_create(
    Path(room_id): Path<RoomId>,
    Auth(identity): Auth,
    State(s): State<Arc<ServerState>>,
    Json(json): Json<InviteCreate>,
) -> Result<(StatusCode, Json<Invite>)> {
    let invite = s
        .services()
        .invites
        .issue(identity.user_id, room_id, json)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

/// List a room's invites
#[utoipa::path(
    get,
    path = "/room/{room_id}/invite",
    tags = ["invite"],
    params(("room_id", description = "Room id")),
    responses(
        (status = OK, description = "success", body = Vec<Invite>),
        (status = FORBIDDEN, description = "not a member of this room"),
    )
)]
async fn invite_list(
    Path(room_id): Path<RoomId>,
    Auth(identity): Auth,
    State(s): State<Arc<ServerState>>,
) -> Result<Json<Vec<Invite>>> {
    let invites = s.services().invites.list(room_id, identity.user_id).await?;
    Ok(Json(invites))
}

/// Preview an invite
///
/// Unauthenticated. Dead or unknown codes are indistinguishable.
#[utoipa::path(
    get,
    path = "/invite/{invite_code}",
    tags = ["invite"],
    params(("invite_code", description = "The code identifying this invite")),
    responses(
        (status = OK, description = "success", body = InvitePreview),
        (status = NOT_FOUND, description = "no such live invite"),
    )
)]
async fn invite_preview(
    Path(code): Path<InviteCode>,
    State(s): State<Arc<ServerState>>,
) -> Result<Json<InvitePreview>> {
    let preview = s.services().invites.preview(&code).await?;
    Ok(Json(preview))
}

/// Accept an invite
///
/// Consumes one use of the code and moves you into its room. The reply is
/// the room snapshot; a live websocket for the same user is told to follow.
#[utoipa::path(
    post,
    path = "/invite/{invite_code}/accept",
    tags = ["invite"],
    params(("invite_code", description = "The code identifying this invite")),
    responses(
        (status = OK, description = "joined", body = RoomSnapshot),
        (status = GONE, description = "invite expired"),
        (status = CONFLICT, description = "usage limit reached or already a member"),
        (status = FORBIDDEN, description = "invite is for someone else"),
    )
)]
async fn invite_accept(
    Path(code): Path<InviteCode>,
    Auth(identity): Auth,
    State(s): State<Arc<ServerState>>,
) -> Result<Json<RoomSnapshot>> {
    let snapshot = s.services().invites.redeem(&code, &identity).await?;
    Ok(Json(snapshot))
}

/// Revoke an invite
///
/// Issuer only. A revoked code behaves exactly like an expired one.
#[utoipa::path(
    delete,
    path = "/invite/{invite_code}",
    tags = ["invite"],
    params(("invite_code", description = "The code identifying this invite")),
    responses(
        (status = NO_CONTENT, description = "success"),
        (status = FORBIDDEN, description = "only the issuer may revoke"),
        (status = CONFLICT, description = "invite already dead"),
    )
)]
async fn invite_delete(
    Path(code): Path<InviteCode>,
    Auth(identity): Auth,
    State(s): State<Arc<ServerState>>,
) -> Result<StatusCode> {
    s.services().invites.revoke(&code, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> OpenApiRouter<Arc<ServerState>> {
    OpenApiRouter::new()
        .routes(routes!(invite_create, invite_list))
        .routes(routes!(invite_preview, invite_delete))
        .routes(routes!(invite_accept))
}
