//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Transport
//! failures are handled at connection granularity and never escalate past
//! the member that produced them; the few variants that reach the HTTP
//! surface render as a structured JSON error response.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "channel not found: lobby"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status                 |
/// |-----------|--------------------|-----------------------------|
/// | 1000–1999 | Validation/Config  | 400 Bad Request             |
/// | 2000–2999 | Not Found          | 404 Not Found               |
/// | 3000–3999 | Server             | 503 Service Unavailable     |
/// | 5000–5999 | Transport          | 502 Bad Gateway             |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// WebSocket handshake or transport setup failed.
    #[error("upgrade failed: {0}")]
    Upgrade(String),

    /// Requested room identifier is not configured.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// Receiving from a member's transport failed.
    #[error("read failed: {0}")]
    Read(String),

    /// The remote end closed the transport.
    #[error("connection closed by peer")]
    Disconnected,

    /// Sending to a member's transport failed.
    #[error("write failed: {0}")]
    Write(String),

    /// A send to one member did not complete within the configured deadline.
    #[error("send timed out after {} ms", .0.as_millis())]
    SendTimeout(Duration),

    /// The hub removed the member, typically after a failed delivery.
    #[error("removed from room")]
    Evicted,

    /// The hub event loop for the room is no longer running.
    #[error("hub for room {0} is not running")]
    HubUnavailable(String),

    /// A room identifier failed validation.
    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),

    /// A configuration value is missing or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRoomId(_) => 1001,
            Self::InvalidConfig(_) => 1002,
            Self::ChannelNotFound(_) => 2001,
            Self::HubUnavailable(_) => 3001,
            Self::Upgrade(_) => 5001,
            Self::Read(_) => 5002,
            Self::Disconnected => 5003,
            Self::Write(_) => 5004,
            Self::SendTimeout(_) => 5005,
            Self::Evicted => 5006,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRoomId(_) | Self::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Self::ChannelNotFound(_) => StatusCode::NOT_FOUND,
            Self::HubUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upgrade(_)
            | Self::Read(_)
            | Self::Disconnected
            | Self::Write(_)
            | Self::SendTimeout(_)
            | Self::Evicted => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns `true` for failures that end a single member's session.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Read(_)
                | Self::Disconnected
                | Self::Write(_)
                | Self::SendTimeout(_)
                | Self::Evicted
        )
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
