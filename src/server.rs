//! Router composition and server bootstrap.

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::RelayConfig;
use crate::domain::RoomRegistry;
use crate::error::RelayError;
use crate::ws::handler::ws_handler;

/// Builds the full application router: HTTP API plus one WebSocket
/// upgrade path per room.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws/{room_id}", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Spawns one hub per configured room and wraps the registry in
/// application state.
///
/// # Errors
///
/// Returns [`RelayError::InvalidConfig`] if the room list is empty or
/// contains duplicates.
pub fn build_state(config: &RelayConfig) -> Result<AppState, RelayError> {
    let rooms = RoomRegistry::spawn(&config.room_ids, config.hub_options())?;
    Ok(AppState::new(rooms))
}

/// Serves the relay on an already-bound listener until the process is
/// killed.
///
/// # Errors
///
/// Returns an I/O error if accepting connections fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, rooms = state.rooms.len(), "server listening");
    }
    axum::serve(listener, build_app(state)).await
}
