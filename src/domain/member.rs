//! Transport abstraction seen by the hub.
//!
//! A connection is split into two halves when it is handed to the
//! connection handler. The [`MemberSink`] half moves into the hub on join
//! and is the only way the hub touches the transport: it delivers payloads
//! and closes the connection on removal. The [`MemberStream`] half stays
//! with the handler's receive loop.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::ws::Utf8Bytes;

use crate::error::RelayError;

/// One relayed message, opaque to the relay.
///
/// The framing kind chosen by the sender is preserved for every
/// recipient. Clones share the underlying buffer, so fan-out does not copy
/// the payload per member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A UTF-8 text frame.
    Text(Utf8Bytes),
    /// A binary frame.
    Binary(Bytes),
}

impl Payload {
    /// Returns the payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.as_str().len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&'static str> for Payload {
    fn from(text: &'static str) -> Self {
        Self::Text(Utf8Bytes::from_static(text))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(Utf8Bytes::from(text))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

/// Outbound half of a member connection, owned by the hub after join.
pub trait MemberSink: Send + Sync + 'static {
    /// Delivers one payload, resolving once the transport accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Write`] if the transport rejects the frame.
    fn send(&mut self, payload: Payload) -> impl Future<Output = Result<(), RelayError>> + Send;

    /// Closes the transport. Calling it again is a no-op.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Closes a transport that was never admitted to a room. Transports
    /// that can carry a close reason should send `reason`.
    fn reject(&mut self, reason: &'static str) -> impl Future<Output = ()> + Send {
        let _ = reason;
        self.close()
    }
}

/// Inbound half of a member connection, owned by the connection handler.
pub trait MemberStream: Send + 'static {
    /// Waits for the next payload from the remote end.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Disconnected`] when the peer closes the
    /// connection and [`RelayError::Read`] on protocol or network faults.
    /// Either is terminal for the connection.
    fn recv(&mut self) -> impl Future<Output = Result<Payload, RelayError>> + Send;
}

/// In-memory transports for exercising hubs and handlers without sockets.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::{MemberSink, MemberStream, Payload};
    use crate::error::RelayError;

    /// Observation side of a [`RecordingSink`].
    #[derive(Debug, Clone, Default)]
    pub(crate) struct SinkProbe {
        received: Arc<Mutex<Vec<Payload>>>,
        closes: Arc<AtomicUsize>,
    }

    impl SinkProbe {
        pub(crate) fn received(&self) -> Vec<Payload> {
            self.received
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default()
        }

        pub(crate) fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Behaviour {
        Accept,
        Fail,
        Stall(Duration),
        Wedged(Duration),
    }

    /// Sink that records deliveries, or fails or stalls on demand. A wedged
    /// sink stalls on both send and close, like a peer that stopped reading.
    #[derive(Debug)]
    pub(crate) struct RecordingSink {
        probe: SinkProbe,
        behaviour: Behaviour,
    }

    impl RecordingSink {
        pub(crate) fn new() -> (Self, SinkProbe) {
            Self::with(Behaviour::Accept)
        }

        pub(crate) fn failing() -> (Self, SinkProbe) {
            Self::with(Behaviour::Fail)
        }

        pub(crate) fn stalling(delay: Duration) -> (Self, SinkProbe) {
            Self::with(Behaviour::Stall(delay))
        }

        pub(crate) fn wedged(delay: Duration) -> (Self, SinkProbe) {
            Self::with(Behaviour::Wedged(delay))
        }

        fn with(behaviour: Behaviour) -> (Self, SinkProbe) {
            let probe = SinkProbe::default();
            (
                Self {
                    probe: probe.clone(),
                    behaviour,
                },
                probe,
            )
        }
    }

    impl MemberSink for RecordingSink {
        async fn send(&mut self, payload: Payload) -> Result<(), RelayError> {
            match self.behaviour {
                Behaviour::Fail => return Err(RelayError::Write("broken pipe".to_string())),
                Behaviour::Stall(delay) | Behaviour::Wedged(delay) => {
                    tokio::time::sleep(delay).await;
                }
                Behaviour::Accept => {}
            }
            if let Ok(mut guard) = self.probe.received.lock() {
                guard.push(payload);
            }
            Ok(())
        }

        async fn close(&mut self) {
            self.probe.closes.fetch_add(1, Ordering::SeqCst);
            if let Behaviour::Wedged(delay) = self.behaviour {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Stream fed by the test through an unbounded channel.
    ///
    /// Dropping the feeding sender reads as a peer disconnect.
    #[derive(Debug)]
    pub(crate) struct ScriptedStream {
        rx: mpsc::UnboundedReceiver<Result<Payload, RelayError>>,
    }

    impl ScriptedStream {
        pub(crate) fn new() -> (Self, mpsc::UnboundedSender<Result<Payload, RelayError>>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { rx }, tx)
        }
    }

    impl MemberStream for ScriptedStream {
        async fn recv(&mut self) -> Result<Payload, RelayError> {
            self.rx.recv().await.unwrap_or(Err(RelayError::Disconnected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_binary_lengths() {
        assert_eq!(Payload::from("hello").len(), 5);
        assert_eq!(Payload::from(vec![0u8, 1, 2]).len(), 3);
        assert!(Payload::from(String::new()).is_empty());
    }

    #[test]
    fn framing_kind_is_part_of_equality() {
        assert_ne!(Payload::from("ab"), Payload::from(b"ab".to_vec()));
    }
}
