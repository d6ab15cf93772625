//! Domain layer: room and connection identity, the hub, and the registry.
//!
//! This module contains the relay's core: the per-room [`Hub`] that owns
//! membership and performs fan-out, the transport traits it drives, and
//! the [`RoomRegistry`] resolving room ids to hubs.

pub mod connection_id;
pub mod hub;
pub mod member;
pub mod room_id;
pub mod room_registry;

pub use connection_id::ConnectionId;
pub use hub::{Eviction, FanOut, Hub, HubHandle, HubOptions};
pub use member::{MemberSink, MemberStream, Payload};
pub use room_id::RoomId;
pub use room_registry::RoomRegistry;
