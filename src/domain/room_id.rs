//! Validated room identifier.
//!
//! [`RoomId`] names one broadcast domain. Identifiers are fixed at startup
//! from configuration and appear verbatim in the upgrade path
//! `/ws/{room_id}`, so only URL-safe characters are accepted.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::RelayError;

/// Longest accepted room identifier, in bytes.
pub const MAX_ROOM_ID_LEN: usize = 64;

/// Immutable identifier of a room.
///
/// Non-empty, at most [`MAX_ROOM_ID_LEN`] bytes, made of ASCII
/// alphanumerics plus `-`, `_` and `.`. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(Arc<str>);

impl RoomId {
    /// Validates and wraps a room identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidRoomId`] if `raw` is empty, too long,
    /// or contains a character outside the allowed set.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ROOM_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        if !valid {
            return Err(RelayError::InvalidRoomId(raw.to_string()));
        }
        Ok(Self(Arc::from(raw)))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
