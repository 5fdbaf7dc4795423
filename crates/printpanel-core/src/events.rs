//! Machine state-change notification source.
//!
//! Provides the per-machine event bus that control sessions subscribe to
//! on creation. Subscribing hands back a [`SubscriptionId`]; the subscriber
//! carries an unsubscribe-on-teardown obligation and must remove its
//! handler before it goes away.

use crate::machine::{MachineState, ToolId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Subscription handle for unsubscribing from machine events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Machine notification payloads
#[derive(Debug, Clone)]
pub enum MachineEvent {
    /// Machine state transition
    StateChanged(MachineState),
    /// A tool reported new status
    ToolStatusChanged(ToolId),
    /// Build progress update
    Progress {
        /// Completed fraction of the build in percent.
        percent: f64,
    },
}

impl fmt::Display for MachineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineEvent::StateChanged(state) => write!(f, "State: {}", state),
            MachineEvent::ToolStatusChanged(tool) => write!(f, "Tool status: {}", tool),
            MachineEvent::Progress { percent } => write!(f, "Progress: {:.1}%", percent),
        }
    }
}

/// Type alias for event handler functions
type EventHandler = Arc<dyn Fn(&MachineEvent) + Send + Sync>;

/// Notification fan-out for one machine.
///
/// Synchronous handlers run on the publishing thread and should return
/// quickly. Handlers are invoked outside the subscription lock, so a
/// handler may unsubscribe — even itself — from inside the callback.
/// Async observers can poll a broadcast receiver instead.
pub struct MachineEventBus {
    sender: broadcast::Sender<MachineEvent>,
    handlers: RwLock<HashMap<SubscriptionId, EventHandler>>,
    last_state: RwLock<Option<MachineState>>,
}

impl MachineEventBus {
    /// Create a bus with the given broadcast capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
            last_state: RwLock::new(None),
        }
    }

    /// Subscribe to machine events with a synchronous handler
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&MachineEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, Arc::new(handler));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Unsubscribe from machine events
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of synchronous handlers notified.
    pub fn publish(&self, event: MachineEvent) -> usize {
        if let MachineEvent::StateChanged(state) = &event {
            *self.last_state.write() = Some(*state);
        }

        let handlers: Vec<EventHandler> = self.handlers.read().values().cloned().collect();
        for handler in &handlers {
            handler(&event);
        }

        // Best effort; lack of async receivers is not an error.
        let _ = self.sender.send(event);
        handlers.len()
    }

    /// Get a receiver for async event polling
    pub fn receiver(&self) -> broadcast::Receiver<MachineEvent> {
        self.sender.subscribe()
    }

    /// Get the most recently published machine state, if any.
    ///
    /// Lets a late subscriber catch up on a transition that was published
    /// before its handler was in place.
    pub fn last_state(&self) -> Option<MachineState> {
        *self.last_state.read()
    }

    /// Get the number of active synchronous subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for MachineEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl fmt::Debug for MachineEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = MachineEventBus::default();

        let id = bus.subscribe(|_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);

        // Double unsubscribe should return false
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_event_delivery() {
        let bus = MachineEventBus::default();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let _id = bus.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let notified = bus.publish(MachineEvent::StateChanged(MachineState::ready()));
        assert_eq!(notified, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_can_unsubscribe_itself() {
        // The session teardown path unsubscribes from inside the
        // state-change callback; that must not deadlock or panic.
        let bus = Arc::new(MachineEventBus::default());
        let slot: Arc<parking_lot::Mutex<Option<SubscriptionId>>> =
            Arc::new(parking_lot::Mutex::new(None));

        let bus_clone = Arc::clone(&bus);
        let slot_clone = Arc::clone(&slot);
        let id = bus.subscribe(move |_| {
            if let Some(id) = slot_clone.lock().take() {
                bus_clone.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        bus.publish(MachineEvent::StateChanged(MachineState::disconnected()));
        assert_eq!(bus.subscriber_count(), 0);

        // A second publish reaches nobody
        assert_eq!(
            bus.publish(MachineEvent::StateChanged(MachineState::ready())),
            0
        );
    }

    #[test]
    fn test_last_state_is_retained() {
        let bus = MachineEventBus::default();
        assert!(bus.last_state().is_none());

        bus.publish(MachineEvent::Progress { percent: 10.0 });
        assert!(bus.last_state().is_none());

        bus.publish(MachineEvent::StateChanged(MachineState::disconnected()));
        assert_eq!(bus.last_state(), Some(MachineState::disconnected()));
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let bus = MachineEventBus::default();
        let mut receiver = bus.receiver();

        bus.publish(MachineEvent::Progress { percent: 42.0 });

        match receiver.try_recv() {
            Ok(MachineEvent::Progress { percent }) => assert_eq!(percent, 42.0),
            other => panic!("Wrong event received: {:?}", other),
        }
    }
}
