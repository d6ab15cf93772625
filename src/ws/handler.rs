//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use super::connection::dispatch;
use super::socket;
use crate::app_state::AppState;
use crate::error::RelayError;

/// `GET /ws/{room_id}` — Upgrade to WebSocket and join the room.
///
/// The room is resolved after the upgrade completes; an unknown room gets
/// a policy-violation close frame instead of a membership.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let rooms = std::sync::Arc::clone(&state.rooms);

    ws.on_failed_upgrade(|err: axum::Error| {
        let err = RelayError::Upgrade(err.to_string());
        tracing::warn!(error = %err, "websocket upgrade aborted");
    })
    .on_upgrade(move |socket| async move {
        let (sink, stream) = socket::split(socket);
        if let Err(err) = dispatch(rooms.as_ref(), &room_id, sink, stream).await {
            tracing::warn!(room = %room_id, error = %err, "rejected websocket connection");
        }
    })
}
