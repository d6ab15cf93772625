//! Room listing DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::RoomId;

/// One configured room and its live membership.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummaryDto {
    /// Room identifier.
    pub room_id: String,
    /// Members joined at the time of the request.
    pub members: usize,
    /// WebSocket upgrade path for this room.
    pub path: String,
}

impl RoomSummaryDto {
    /// Builds the summary for `room_id` with the given member count.
    #[must_use]
    pub fn new(room_id: &RoomId, members: usize) -> Self {
        Self {
            room_id: room_id.to_string(),
            members,
            path: format!("/ws/{room_id}"),
        }
    }
}

/// Response body of `GET /rooms`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Rooms in lexical order.
    pub rooms: Vec<RoomSummaryDto>,
    /// Sum of members across all rooms.
    pub total_members: usize,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn summary_points_at_upgrade_path() {
        let Ok(id) = RoomId::parse("channel-1") else {
            panic!("valid id");
        };
        let dto = RoomSummaryDto::new(&id, 4);
        let Ok(json) = serde_json::to_value(&dto) else {
            panic!("serializable");
        };
        assert_eq!(
            json.get("path").and_then(|v| v.as_str()),
            Some("/ws/channel-1")
        );
        assert_eq!(json.get("members").and_then(|v| v.as_u64()), Some(4));
    }
}
