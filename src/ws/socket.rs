//! axum WebSocket adapter for the hub's transport traits.
//!
//! An upgraded [`WebSocket`] is split into a [`WsSink`] that moves into the
//! hub and a [`WsStream`] that stays with the connection handler. Text and
//! binary frames map one-to-one onto [`Payload`]; control frames are not
//! relayed.

use std::fmt;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::domain::{MemberSink, MemberStream, Payload};
use crate::error::RelayError;

/// Close code sent when the requested room does not exist (policy violation).
pub const CLOSE_POLICY: u16 = 1008;

/// Splits an upgraded socket into its hub-side and handler-side halves.
#[must_use]
pub fn split(socket: WebSocket) -> (WsSink, WsStream) {
    let (sink, stream) = socket.split();
    (
        WsSink {
            sink,
            closed: false,
        },
        WsStream { stream },
    )
}

/// Outbound half of a WebSocket member.
pub struct WsSink {
    sink: SplitSink<WebSocket, Message>,
    closed: bool,
}

impl fmt::Debug for WsSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsSink").field("closed", &self.closed).finish()
    }
}

impl WsSink {
    /// Sends a close frame, then shuts the sink down. Later calls are
    /// no-ops.
    async fn shutdown(&mut self, frame: Option<CloseFrame>) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.sink.send(Message::Close(frame)).await {
            tracing::debug!(error = %err, "close frame not delivered");
        }
        if let Err(err) = self.sink.close().await {
            tracing::debug!(error = %err, "ws sink close failed");
        }
    }
}

impl MemberSink for WsSink {
    async fn send(&mut self, payload: Payload) -> Result<(), RelayError> {
        if self.closed {
            return Err(RelayError::Write("connection already closed".to_string()));
        }
        let message = match payload {
            Payload::Text(text) => Message::Text(text),
            Payload::Binary(bytes) => Message::Binary(bytes),
        };
        self.sink
            .send(message)
            .await
            .map_err(|err| RelayError::Write(err.to_string()))
    }

    async fn close(&mut self) {
        self.shutdown(None).await;
    }

    async fn reject(&mut self, reason: &'static str) {
        let frame = CloseFrame {
            code: CLOSE_POLICY,
            reason: Utf8Bytes::from_static(reason),
        };
        self.shutdown(Some(frame)).await;
    }
}

/// Inbound half of a WebSocket member.
pub struct WsStream {
    stream: SplitStream<WebSocket>,
}

impl fmt::Debug for WsStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsStream").finish_non_exhaustive()
    }
}

impl MemberStream for WsStream {
    async fn recv(&mut self) -> Result<Payload, RelayError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Payload::Text(text)),
                Some(Ok(Message::Binary(bytes))) => return Ok(Payload::Binary(bytes)),
                // axum answers pings itself
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => return Err(RelayError::Disconnected),
                Some(Err(err)) => return Err(RelayError::Read(err.to_string())),
            }
        }
    }
}
