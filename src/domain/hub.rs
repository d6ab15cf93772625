//! Per-room broadcast hub.
//!
//! A [`Hub`] owns the membership set of one room and services join, leave
//! and broadcast events one at a time from a single task, so the set is
//! never observed or mutated concurrently. Connection handlers talk to it
//! only through a cloneable [`HubHandle`].
//!
//! Delivery within a broadcast is sequential. Without a send deadline a
//! member whose transport stops accepting frames stalls the whole room
//! until its send fails (head-of-line blocking); set
//! [`HubOptions::send_timeout`] to bound each member's send. The same
//! deadline bounds the close of a removed member, so a peer that stops
//! reading cannot hold the room on either step.
//!
//! Removal is signalled back to the member's connection handler through
//! the [`Eviction`] returned on join, which resolves once the hub has let
//! go of the member for any reason. The loop has no shutdown operation and
//! runs until every handle is dropped.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::member::{MemberSink, Payload};
use super::{ConnectionId, RoomId};
use crate::error::RelayError;

/// Default depth of a hub's event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Tuning knobs shared by every hub in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubOptions {
    /// Bound of the event queue; submitters wait while it is full.
    pub queue_capacity: usize,
    /// Deadline for a single member's send. `None` waits indefinitely.
    pub send_timeout: Option<Duration>,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout: None,
        }
    }
}

/// Resolves once the hub no longer holds the member it was issued for.
///
/// The hub keeps the paired sender next to the member's sink and drops it
/// on leave, on a failed delivery, or when the loop stops.
#[derive(Debug)]
pub struct Eviction(oneshot::Receiver<()>);

impl Eviction {
    fn pair() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self(rx))
    }

    /// Waits until the member has been removed from its room. Cancel safe.
    pub async fn removed(&mut self) {
        let _ = (&mut self.0).await;
    }
}

struct Member<S> {
    sink: S,
    evicted: oneshot::Sender<()>,
}

/// Delivery report of one broadcast pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Members whose send succeeded.
    pub delivered: usize,
    /// Members removed because their send failed or timed out.
    pub dropped: Vec<ConnectionId>,
}

enum HubEvent<S> {
    Join(ConnectionId, S, oneshot::Sender<()>),
    Leave(ConnectionId),
    Broadcast(Payload),
    MemberCount(oneshot::Sender<usize>),
}

/// Membership set and fan-out engine for one room.
pub struct Hub<S> {
    room_id: RoomId,
    members: HashMap<ConnectionId, Member<S>>,
    send_timeout: Option<Duration>,
}

impl<S> fmt::Debug for Hub<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("room_id", &self.room_id)
            .field("members", &self.members.len())
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

impl<S: MemberSink> Hub<S> {
    /// Creates an idle hub with no members.
    #[must_use]
    pub fn new(room_id: RoomId, send_timeout: Option<Duration>) -> Self {
        Self {
            room_id,
            members: HashMap::new(),
            send_timeout,
        }
    }

    /// Spawns the hub's event loop on the current tokio runtime and
    /// returns the handle used to submit events to it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(room_id: RoomId, options: HubOptions) -> HubHandle<S> {
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let hub = Self::new(room_id.clone(), options.send_timeout);
        tokio::spawn(hub.run(rx));
        HubHandle { room_id, tx }
    }

    /// Returns the room this hub serves.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Returns the current number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the room has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if `id` is currently a member.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.contains_key(&id)
    }

    /// Adds a member. Identities are unique per connection, so no
    /// duplicate check is made.
    pub fn join(&mut self, id: ConnectionId, sink: S) -> Eviction {
        let (evicted, eviction) = Eviction::pair();
        self.insert(id, sink, evicted);
        eviction
    }

    fn insert(&mut self, id: ConnectionId, sink: S, evicted: oneshot::Sender<()>) {
        self.members.insert(id, Member { sink, evicted });
        tracing::debug!(room = %self.room_id, connection = %id, members = self.members.len(), "member joined");
    }

    /// Removes a member, signals its [`Eviction`] and closes its transport.
    /// Absent members are ignored, which makes repeated leaves harmless.
    pub async fn leave(&mut self, id: ConnectionId) {
        let Some(Member { sink, evicted }) = self.members.remove(&id) else {
            return;
        };
        drop(evicted);
        self.close_member(id, sink).await;
        tracing::debug!(room = %self.room_id, connection = %id, members = self.members.len(), "member left");
    }

    /// Closes a removed member's transport within the send deadline.
    async fn close_member(&self, id: ConnectionId, mut sink: S) {
        match self.send_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, sink.close()).await.is_err() {
                    tracing::warn!(room = %self.room_id, connection = %id, timeout = ?limit, "close timed out, abandoning transport");
                }
            }
            None => sink.close().await,
        }
    }

    /// Delivers `payload` to every current member, the sender included.
    ///
    /// A failed send only affects that member: delivery continues to the
    /// rest, and failed members are removed and closed once the pass is
    /// over.
    pub async fn broadcast(&mut self, payload: Payload) -> FanOut {
        let mut report = FanOut::default();

        for (id, member) in &mut self.members {
            let sent = match self.send_timeout {
                Some(limit) => tokio::time::timeout(limit, member.sink.send(payload.clone()))
                    .await
                    .unwrap_or(Err(RelayError::SendTimeout(limit))),
                None => member.sink.send(payload.clone()).await,
            };
            match sent {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!(room = %self.room_id, connection = %id, error = %err, "dropping member after failed delivery");
                    report.dropped.push(*id);
                }
            }
        }

        for id in &report.dropped {
            self.leave(*id).await;
        }

        tracing::trace!(
            room = %self.room_id,
            bytes = payload.len(),
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "broadcast complete"
        );
        report
    }

    /// Services events until every [`HubHandle`] has been dropped.
    async fn run(mut self, mut events: mpsc::Receiver<HubEvent<S>>) {
        tracing::info!(room = %self.room_id, "hub started");

        while let Some(event) = events.recv().await {
            match event {
                HubEvent::Join(id, sink, evicted) => self.insert(id, sink, evicted),
                HubEvent::Leave(id) => self.leave(id).await,
                HubEvent::Broadcast(payload) => {
                    self.broadcast(payload).await;
                }
                HubEvent::MemberCount(reply) => {
                    let _ = reply.send(self.members.len());
                }
            }
        }

        for (id, Member { sink, evicted }) in std::mem::take(&mut self.members) {
            drop(evicted);
            self.close_member(id, sink).await;
        }
        tracing::info!(room = %self.room_id, "hub stopped");
    }
}

/// Submission side of a running [`Hub`].
///
/// Every method waits for queue space, not for the event to be serviced,
/// except [`HubHandle::member_count`] which waits for the reply.
pub struct HubHandle<S> {
    room_id: RoomId,
    tx: mpsc::Sender<HubEvent<S>>,
}

impl<S> Clone for HubHandle<S> {
    fn clone(&self) -> Self {
        Self {
            room_id: self.room_id.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<S> fmt::Debug for HubHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubHandle")
            .field("room_id", &self.room_id)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<S: MemberSink> HubHandle<S> {
    /// Returns the room served by the hub behind this handle.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Submits a join for `sink` under identity `id`. The returned
    /// [`Eviction`] resolves once the hub removes the member.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub loop has stopped.
    /// The sink is closed before returning in that case.
    pub async fn join(&self, id: ConnectionId, sink: S) -> Result<Eviction, RelayError> {
        let (evicted, eviction) = Eviction::pair();
        if let Err(mpsc::error::SendError(event)) =
            self.tx.send(HubEvent::Join(id, sink, evicted)).await
        {
            if let HubEvent::Join(_, mut sink, _) = event {
                sink.close().await;
            }
            return Err(self.unavailable());
        }
        Ok(eviction)
    }

    /// Submits a leave for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub loop has stopped.
    pub async fn leave(&self, id: ConnectionId) -> Result<(), RelayError> {
        self.submit(HubEvent::Leave(id)).await
    }

    /// Submits `payload` for delivery to every member.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub loop has stopped.
    pub async fn broadcast(&self, payload: Payload) -> Result<(), RelayError> {
        self.submit(HubEvent::Broadcast(payload)).await
    }

    /// Returns the member count as seen by the hub loop after every event
    /// submitted before this call.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub loop has stopped.
    pub async fn member_count(&self) -> Result<usize, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(HubEvent::MemberCount(reply_tx)).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Submits a leave from a detached task. Used where awaiting is not
    /// possible, such as `Drop`.
    pub fn leave_detached(&self, id: ConnectionId) {
        let tx = self.tx.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let _ = tx.send(HubEvent::Leave(id)).await;
                });
            }
            Err(_) => {
                let _ = tx.try_send(HubEvent::Leave(id));
            }
        }
    }

    async fn submit(&self, event: HubEvent<S>) -> Result<(), RelayError> {
        self.tx.send(event).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RelayError {
        RelayError::HubUnavailable(self.room_id.to_string())
    }
}
