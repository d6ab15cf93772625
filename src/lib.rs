//! # room-relay
//!
//! Real-time WebSocket fan-out relay over a fixed set of named rooms.
//!
//! Every frame a member sends to a room is relayed, byte for byte, to all
//! members currently in that room, the sender included. Rooms are fixed at
//! startup; there is no persistence, acknowledgment, or authentication.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler (ws/)          GET /ws/{room_id}
//!     ├── REST Handlers (api/)      /health, /rooms
//!     │
//!     ├── RoomRegistry (domain/)    room id -> hub, fixed at startup
//!     │
//!     └── Hub (domain/)             one task per room: join, leave, fan-out
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod ws;
