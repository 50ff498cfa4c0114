//! Broadcast of patch messages to connected browser streams.
//!
//! Each open `/__sse` connection holds a [`Subscription`]. Publishing walks
//! the subscriber set under its lock, so every stream observes patches in the
//! same order. Each subscriber has a bounded queue; a stream that falls
//! [`SUBSCRIBER_QUEUE`] patches behind, or whose receiving end has gone away,
//! is pruned. Delivery is at most once and nothing is replayed to late
//! subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use axum::response::sse::Event;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::debug;

use crate::target::{Swap, Target};

pub(crate) const PATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::patch");

/// Patches buffered for one stream before it counts as stalled.
pub const SUBSCRIBER_QUEUE: usize = 64;

/// Heartbeat event written to idle streams.
#[must_use]
pub(crate) fn ping_event() -> Event {
    Event::default().event("ping").data("{}")
}

/// Instruction telling connected browsers to swap a target's HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchMessage {
    /// Element id of the target.
    pub id: String,
    /// How the HTML is applied.
    pub swap: Swap,
    /// Replacement markup.
    pub html: String,
}

impl PatchMessage {
    /// Creates a message for an explicit id and swap mode.
    pub fn new(id: impl Into<String>, swap: Swap, html: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            swap,
            html: html.into(),
        }
    }

    /// Creates a message using the target's default swap mode.
    pub fn for_target(target: &Target, html: impl Into<String>) -> Self {
        Self::new(target.id(), target.swap(), html)
    }

    /// Wraps the message in a server-sent `patch` event.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error if the payload cannot be encoded.
    pub fn to_event(&self) -> Result<Event, axum::Error> {
        Event::default().event("patch").json_data(self)
    }
}

type SubscriberList = Vec<(u64, Sender<PatchMessage>)>;

#[derive(Debug, Default)]
struct ChannelState {
    subscribers: Mutex<SubscriberList>,
    next_id: AtomicU64,
}

impl ChannelState {
    fn remove(&self, subscriber: u64) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|(id, _)| *id != subscriber);
    }
}

/// Process-wide broadcast set of open patch streams.
///
/// Clones share the same subscriber set.
#[derive(Debug, Clone, Default)]
pub struct PatchChannel {
    state: Arc<ChannelState>,
}

impl PatchChannel {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_QUEUE);
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, sender));
        debug!(target: PATCH_TARGET, subscriber = id, "stream subscribed");
        Subscription {
            id,
            receiver,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Queues `message` on every open subscriber, returning how many
    /// accepted it.
    ///
    /// The subscriber lock is held for the whole walk. Queueing never blocks:
    /// subscribers that are full or closed are removed instead.
    pub fn publish(&self, message: PatchMessage) -> usize {
        let mut subscribers = self
            .state
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        let mut delivered = 0_usize;
        subscribers.retain(|(id, sender)| match sender.try_send(message.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(target: PATCH_TARGET, subscriber = id, "stream stalled; pruning");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });
        let pruned = before - subscribers.len();
        drop(subscribers);

        debug!(
            target: PATCH_TARGET,
            id = %message.id,
            swap = %message.swap,
            delivered,
            pruned,
            "published patch"
        );
        delivered
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Receiving end of one patch stream. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: Receiver<PatchMessage>,
    state: Weak<ChannelState>,
}

impl Subscription {
    /// Waits for the next message.
    ///
    /// Returns `None` once the channel has pruned this subscriber and the
    /// queued messages are drained.
    pub async fn recv(&mut self) -> Option<PatchMessage> {
        self.receiver.recv().await
    }

    /// Returns the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<PatchMessage> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.remove(self.id);
            debug!(target: PATCH_TARGET, subscriber = self.id, "stream unsubscribed");
        }
    }
}
