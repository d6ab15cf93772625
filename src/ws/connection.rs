//! Connection handler: bridges one upgraded transport to its room's hub.
//!
//! [`dispatch`] resolves the requested room and rejects the transport if
//! the room is unknown. [`run_connection`] then joins the hub, turns every
//! received payload into a broadcast, and leaves exactly once when the
//! receive loop ends. The loop also ends as soon as the hub evicts the
//! member, so a dropped connection can no longer inject payloads.

use crate::domain::{ConnectionId, HubHandle, MemberSink, MemberStream, RoomRegistry};
use crate::error::RelayError;

/// Resolves `room_id` and runs the connection against that room's hub.
///
/// # Errors
///
/// Returns [`RelayError::ChannelNotFound`] if the room is not configured.
/// The transport has already been closed and nothing joined any hub when
/// this error is returned.
pub async fn dispatch<S, R>(
    registry: &RoomRegistry<S>,
    room_id: &str,
    mut sink: S,
    stream: R,
) -> Result<(), RelayError>
where
    S: MemberSink,
    R: MemberStream,
{
    let hub = match registry.lookup(room_id) {
        Ok(hub) => hub.clone(),
        Err(err) => {
            sink.reject("channel not found").await;
            drop(stream);
            return Err(err);
        }
    };
    run_connection(hub, sink, stream).await;
    Ok(())
}

/// Drives one connection's lifecycle against `hub`.
///
/// Receive failures end the session for this connection only; they are
/// logged and never propagated.
pub async fn run_connection<S, R>(hub: HubHandle<S>, sink: S, mut stream: R)
where
    S: MemberSink,
    R: MemberStream,
{
    let id = ConnectionId::new();
    let room = hub.room_id().clone();

    let mut eviction = match hub.join(id, sink).await {
        Ok(eviction) => eviction,
        Err(err) => {
            tracing::warn!(room = %room, connection = %id, error = %err, "join rejected");
            return;
        }
    };
    let membership = Membership::new(hub, id);
    tracing::info!(room = %room, connection = %id, "connection joined");

    let reason = loop {
        tokio::select! {
            biased;
            () = eviction.removed() => break RelayError::Evicted,
            received = stream.recv() => match received {
                Ok(payload) => {
                    if let Err(err) = membership.hub.broadcast(payload).await {
                        break err;
                    }
                }
                Err(err) => break err,
            },
        }
    };

    if matches!(reason, RelayError::Disconnected) {
        tracing::info!(room = %room, connection = %id, "connection closed");
    } else if reason.is_transport() {
        tracing::warn!(room = %room, connection = %id, error = %reason, "connection terminated");
    } else {
        tracing::error!(room = %room, connection = %id, error = %reason, "room stopped relaying");
    }
    membership.leave().await;
}

/// Guarantees a single leave for a joined connection, even if the handler
/// future is dropped before reaching its normal exit.
struct Membership<S: MemberSink> {
    hub: HubHandle<S>,
    id: ConnectionId,
    active: bool,
}

impl<S: MemberSink> Membership<S> {
    fn new(hub: HubHandle<S>, id: ConnectionId) -> Self {
        Self {
            hub,
            id,
            active: true,
        }
    }

    async fn leave(mut self) {
        self.active = false;
        if let Err(err) = self.hub.leave(self.id).await {
            tracing::debug!(connection = %self.id, error = %err, "leave not delivered");
        }
    }
}

impl<S: MemberSink> Drop for Membership<S> {
    fn drop(&mut self) {
        if self.active {
            self.hub.leave_detached(self.id);
        }
    }
}
