//! WebSocket layer: upgrade handling, socket adapter, connection handler.
//!
//! Each configured room is reachable at `/ws/{room_id}`. Every frame a
//! member sends is relayed unchanged to all members of the same room.

pub mod connection;
pub mod handler;
pub mod socket;
