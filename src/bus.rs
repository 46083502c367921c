//! In-process pub/sub for [`SessionEvent`]s.
//!
//! The [`EventBus`] decouples the transport loop from its consumers: the
//! session projection, diagnostics, and any telemetry reader subscribe
//! independently and each receive their own clone of every published event.
//! The bus is an explicit injected instance, not process-wide state, so a
//! test can stand one up per case and inspect exactly its subscriber set.
//!
//! Subscriber channels are bounded; a consumer that cannot keep up has
//! events dropped (with a warning) rather than stalling the transport loop.
//! [`EventBus::publish_always`] bypasses the drop policy for events that
//! must never be lost, such as the final `Disconnected`.

use std::sync::Mutex as StdMutex;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::{EventKind, SessionEvent};

/// Default per-subscriber channel capacity.
const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

/// Opaque handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    /// `None` subscribes to every event.
    filter: Option<EventKind>,
    tx: mpsc::Sender<SessionEvent>,
}

struct Inner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Fan-out hub for session events.
pub struct EventBus {
    inner: StdMutex<Inner>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus with the default per-subscriber channel capacity (256).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a bus with a custom per-subscriber channel capacity.
    /// Values below 1 are clamped to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: StdMutex::new(Inner {
                next_id: 0,
                subscribers: Vec::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events of a single kind.
    pub fn subscribe(&self, kind: EventKind) -> (SubscriptionId, mpsc::Receiver<SessionEvent>) {
        self.add_subscriber(Some(kind))
    }

    /// Subscribe to every event.
    pub fn subscribe_all(&self) -> (SubscriptionId, mpsc::Receiver<SessionEvent>) {
        self.add_subscriber(None)
    }

    /// Remove a subscription. A no-op for ids that were never registered or
    /// were already removed — UI teardown routinely races with in-flight
    /// connects.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.lock();
        inner.subscribers.retain(|s| s.id != id);
    }

    /// Publish an event to every matching subscriber.
    ///
    /// Uses `try_send`: a full subscriber channel drops the event for that
    /// subscriber with a warning. Closed subscribers are pruned.
    pub fn publish(&self, event: &SessionEvent) {
        let mut inner = self.lock();
        inner.subscribers.retain(|sub| {
            if !matches(sub.filter, event) {
                return true;
            }
            match sub.tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(kind = ?event.kind(), "subscriber channel full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(id = ?sub.id, "pruning closed subscriber");
                    false
                }
            }
        });
    }

    /// Publish an event that must not be dropped, waiting for channel space
    /// per subscriber. Used for the final `Disconnected` event.
    pub async fn publish_always(&self, event: SessionEvent) {
        let targets: Vec<mpsc::Sender<SessionEvent>> = {
            let inner = self.lock();
            inner
                .subscribers
                .iter()
                .filter(|s| matches(s.filter, &event))
                .map(|s| s.tx.clone())
                .collect()
        };
        for tx in targets {
            if tx.send(event.clone()).await.is_err() {
                debug!("subscriber closed before critical event delivery");
            }
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn add_subscriber(
        &self,
        filter: Option<EventKind>,
    ) -> (SubscriptionId, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber { id, filter, tx });
        (id, rx)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Subscriber bookkeeping cannot leave the list inconsistent on
        // panic, so a poisoned lock is safe to keep using.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
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
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn matches(filter: Option<EventKind>, event: &SessionEvent) -> bool {
    filter.is_none_or(|kind| kind == event.kind())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multiple_subscribers_each_receive_events() {
        let bus = EventBus::new();
        let (_id1, mut rx1) = bus.subscribe_all();
        let (_id2, mut rx2) = bus.subscribe(EventKind::Connected);

        bus.publish(&SessionEvent::Connected);

        assert_eq!(rx1.recv().await.unwrap(), SessionEvent::Connected);
        assert_eq!(rx2.recv().await.unwrap(), SessionEvent::Connected);
    }

    #[tokio::test]
    async fn kind_filter_excludes_other_events() {
        let bus = EventBus::new();
        let (_id, mut rx) = bus.subscribe(EventKind::ServerError);

        bus.publish(&SessionEvent::Connected);
        bus.publish(&SessionEvent::ServerError {
            message: "room full".into(),
        });

        let ev = rx.recv().await.unwrap();
        assert!(matches!(ev, SessionEvent::ServerError { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unsubscribe_unknown_id_is_noop() {
        let bus = EventBus::new();
        let (id, rx) = bus.subscribe_all();
        drop(rx);
        bus.unsubscribe(id);
        // Same id again, and an id that never existed.
        bus.unsubscribe(id);
        bus.unsubscribe(SubscriptionId(9999));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn publish_prunes_closed_subscribers() {
        let bus = EventBus::new();
        let (_id, rx) = bus.subscribe_all();
        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(&SessionEvent::Connected);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let bus = EventBus::with_capacity(1);
        let (_id, mut rx) = bus.subscribe_all();

        bus.publish(&SessionEvent::Connected);
        bus.publish(&SessionEvent::RaceClockExpired); // dropped, channel full

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Connected);
        assert!(rx.try_recv().is_err());
        // The subscriber survives the drop.
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn publish_always_waits_for_space() {
        let bus = EventBus::with_capacity(1);
        let (_id, mut rx) = bus.subscribe_all();

        bus.publish(&SessionEvent::Connected);
        let deliver = bus.publish_always(SessionEvent::Disconnected { reason: None });
        // Drain while the critical publish is pending.
        let (first, ()) = tokio::join!(async { rx.recv().await.unwrap() }, deliver);
        assert_eq!(first, SessionEvent::Connected);
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, SessionEvent::Disconnected { .. }));
    }
}
