//! HTTP API layer: read-only inspection endpoints and OpenAPI document.
//!
//! The relay itself speaks WebSocket only; these routes expose health and
//! room membership for operators.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every HTTP endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "room-relay", description = "WebSocket fan-out relay over fixed rooms"),
    paths(
        handlers::system::health_handler,
        handlers::rooms::list_rooms,
        handlers::rooms::get_room,
    ),
    components(schemas(
        handlers::system::HealthResponse,
        dto::RoomSummaryDto,
        dto::RoomListResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "Rooms", description = "Room inspection"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new().merge(handlers::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
