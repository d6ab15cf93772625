//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::RoomRegistry;
use crate::ws::socket::WsSink;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Room registry, fixed at startup.
    pub rooms: Arc<RoomRegistry<WsSink>>,
}

impl AppState {
    /// Wraps a registry built at startup.
    #[must_use]
    pub fn new(rooms: RoomRegistry<WsSink>) -> Self {
        Self {
            rooms: Arc::new(rooms),
        }
    }
}
