//! Room inspection handlers: list rooms, get one room.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{RoomListResponse, RoomSummaryDto};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `GET /rooms` — List configured rooms with live member counts.
///
/// # Errors
///
/// Returns [`RelayError::HubUnavailable`] if a room's hub has stopped.
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns every configured room, its WebSocket path, and the number of members currently joined.",
    responses(
        (status = 200, description = "Room list", body = RoomListResponse),
        (status = 503, description = "A room's hub is not running", body = ErrorResponse),
    )
)]
pub async fn list_rooms(State(state): State<AppState>) -> Result<impl IntoResponse, RelayError> {
    let mut rooms = Vec::with_capacity(state.rooms.len());
    for room_id in state.rooms.rooms() {
        let members = state.rooms.lookup(room_id.as_str())?.member_count().await?;
        rooms.push(RoomSummaryDto::new(&room_id, members));
    }
    let total_members = rooms.iter().map(|r| r.members).sum();
    Ok(Json(RoomListResponse {
        rooms,
        total_members,
    }))
}

/// `GET /rooms/{room_id}` — Get one room.
///
/// # Errors
///
/// Returns [`RelayError::ChannelNotFound`] for an unknown room id.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}",
    tag = "Rooms",
    summary = "Get room",
    description = "Returns one room's WebSocket path and current member count.",
    params(("room_id" = String, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Room details", body = RoomSummaryDto),
        (status = 404, description = "Room not configured", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let hub = state.rooms.lookup(&room_id)?;
    let members = hub.member_count().await?;
    Ok(Json(RoomSummaryDto::new(hub.room_id(), members)))
}

/// Room routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{room_id}", get(get_room))
}
