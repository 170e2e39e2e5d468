//! Broadcast bus with a bounded replay log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::types::{Event, EventEnvelope};

const CHANNEL_CAPACITY: usize = 256;
const REPLAY_LIMIT: usize = 512;

/// Fan-out bus for item and batch events.
///
/// Every published envelope is also kept in a replay log of the most recent
/// events, so a subscriber that reconnects with the id of the last envelope
/// it saw can catch up on what it missed. Subscribers slower than the
/// channel capacity lag and skip the oldest live events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    replay: Arc<Mutex<VecDeque<EventEnvelope>>>,
    replay_limit: usize,
}

/// Envelopes to deliver before the live stream, plus the live receiver.
pub struct Subscription {
    pub missed: Vec<EventEnvelope>,
    pub receiver: broadcast::Receiver<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_limits(CHANNEL_CAPACITY, REPLAY_LIMIT)
    }

    pub fn with_limits(capacity: usize, replay_limit: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            replay: Arc::new(Mutex::new(VecDeque::with_capacity(replay_limit))),
            replay_limit,
        }
    }

    /// Wraps `event` in an envelope, records it and broadcasts it.
    pub fn publish(&self, event: Event) -> EventEnvelope {
        let envelope = EventEnvelope::new(event);
        let mut replay = self.replay();

        if self.replay_limit > 0 {
            if replay.len() == self.replay_limit {
                replay.pop_front();
            }
            replay.push_back(envelope.clone());
        }

        let delivered = self.sender.send(envelope.clone()).unwrap_or(0);
        tracing::trace!(
            event_id = %envelope.id,
            event_type = envelope.event.event_type(),
            delivered,
            "Event published"
        );

        envelope
    }

    /// Live receiver only. Events published earlier are not delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Subscribes and collects the envelopes published after `last_seen`.
    ///
    /// The replay log is locked while subscribing, so no envelope is both
    /// replayed and received live, and none falls between the two. An id
    /// no longer in the log (or `None`) replays nothing.
    pub fn subscribe_after(&self, last_seen: Option<Uuid>) -> Subscription {
        let replay = self.replay();
        let receiver = self.sender.subscribe();

        let missed = match last_seen {
            Some(id) => match replay.iter().position(|envelope| envelope.id == id) {
                Some(index) => replay.iter().skip(index + 1).cloned().collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        Subscription { missed, receiver }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn replay_len(&self) -> usize {
        self.replay().len()
    }

    fn replay(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.replay.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("replay_len", &self.replay_len())
            .finish()
    }
}
