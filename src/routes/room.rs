use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::Result;
use crate::types::{Room, RoomCreate, RoomId, RoomMember, RoomSnapshot};
use crate::ServerState;

use super::util::Auth;

/// Create a room
///
/// The creator is moved into the new room as its first member; the reply
/// carries the full snapshot (history is empty, members is just you).
#[utoipa::path(
    post,
    path = "/room",
    tags = ["room"],
    responses(
        (status = CREATED, description = "room created", body = RoomSnapshot),
        (status = CONFLICT, description = "room name already taken"),
    )
)]
async fn room_create(
    Auth(identity): Auth,
    State(s): State<Arc<ServerState>>,
    Json(json): Json<RoomCreate>,
) -> Result<(StatusCode, Json<RoomSnapshot>)> {
    let snapshot = s.services().rooms.create(json, identity.user_id).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// List active rooms
#[utoipa::path(
    get,
    path = "/room",
    tags = ["room"],
    responses(
        (status = OK, description = "success", body = Vec<Room>),
    )
)]
async fn room_list(
    Auth(_identity): Auth,
    State(s): State<Arc<ServerState>>,
) -> Result<Json<Vec<Room>>> {
    let rooms = s.services().rooms.list().await?;
    Ok(Json(rooms))
}

/// Get a room by its id
#[utoipa::path(
    get,
    path = "/room/{room_id}",
    tags = ["room"],
    params(("room_id", description = "Room id")),
    responses(
        (status = OK, description = "success", body = Room),
    )
)]
async fn room_get(
    Path(room_id): Path<RoomId>,
    Auth(_identity): Auth,
    State(s): State<Arc<ServerState>>,
) -> Result<Json<Room>> {
    let room = s.services().rooms.get(room_id).await?;
    Ok(Json(room))
}

/// List a room's members, with live online flags
#[utoipa::path(
    get,
    path = "/room/{room_id}/member",
    tags = ["room"],
    params(("room_id", description = "Room id")),
    responses(
        (status = OK, description = "success", body = Vec<RoomMember>),
    )
)]
async fn room_member_list(
    Path(room_id): Path<RoomId>,
    Auth(_identity): Auth,
    State(s): State<Arc<ServerState>>,
) -> Result<Json<Vec<RoomMember>>> {
    // existence check first so an unknown room is a 404, not an empty list
    s.services().rooms.get(room_id).await?;
    let members = s.services().members.list_members(room_id).await?;
    Ok(Json(members))
}

pub fn routes() -> OpenApiRouter<Arc<ServerState>> {
    OpenApiRouter::new()
        .routes(routes!(room_create, room_list))
        .routes(routes!(room_get))
        .routes(routes!(room_member_list))
}
