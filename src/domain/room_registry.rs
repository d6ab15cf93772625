//! Static mapping from room identifier to hub.
//!
//! [`RoomRegistry`] is built once at startup from the configured room ids,
//! spawning one [`Hub`] per room. It is read-only afterwards and shared
//! with the dispatch layer behind an `Arc`, so lookups take no lock.

use std::collections::HashMap;
use std::fmt;

use super::hub::{Hub, HubHandle, HubOptions};
use super::member::MemberSink;
use super::RoomId;
use crate::error::RelayError;

/// Immutable set of rooms, each served by its own hub.
pub struct RoomRegistry<S> {
    hubs: HashMap<RoomId, HubHandle<S>>,
}

impl<S> fmt::Debug for RoomRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rooms: Vec<_> = self.hubs.keys().map(RoomId::as_str).collect();
        rooms.sort_unstable();
        f.debug_struct("RoomRegistry").field("rooms", &rooms).finish()
    }
}

impl<S: MemberSink> RoomRegistry<S> {
    /// Spawns one hub per room id on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if `room_ids` is empty or
    /// names the same room twice.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(room_ids: &[RoomId], options: HubOptions) -> Result<Self, RelayError> {
        if room_ids.is_empty() {
            return Err(RelayError::InvalidConfig(
                "at least one room id is required".to_string(),
            ));
        }

        let mut hubs = HashMap::with_capacity(room_ids.len());
        for room_id in room_ids {
            if hubs.contains_key(room_id) {
                return Err(RelayError::InvalidConfig(format!(
                    "room id {room_id} is configured more than once"
                )));
            }
            hubs.insert(room_id.clone(), Hub::spawn(room_id.clone(), options));
        }

        tracing::info!(rooms = hubs.len(), "room registry ready");
        Ok(Self { hubs })
    }

    /// Resolves a room identifier to its hub.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ChannelNotFound`] if no such room is
    /// configured.
    pub fn lookup(&self, room_id: &str) -> Result<&HubHandle<S>, RelayError> {
        RoomId::parse(room_id)
            .ok()
            .and_then(|id| self.hubs.get(&id))
            .ok_or_else(|| RelayError::ChannelNotFound(room_id.to_string()))
    }

    /// Returns the configured room ids in lexical order.
    #[must_use]
    pub fn rooms(&self) -> Vec<RoomId> {
        let mut rooms: Vec<_> = self.hubs.keys().cloned().collect();
        rooms.sort_unstable();
        rooms
    }

    /// Returns the number of configured rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    /// Returns `true` if no rooms are configured. Never the case for a
    /// registry built through [`RoomRegistry::spawn`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }
}
