use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use sim_runtime::NegotiationReport;
use tracing::{debug, warn};

use crate::ids::{FactionId, ProvinceId};
use crate::world::WorldState;

/// Change notifications delivered to store subscribers.
///
/// Every notification is published only after the state it describes has been installed,
/// so a subscriber that reacts by calling [`WorldStateStore::current`] sees that state or a
/// later one.
#[derive(Debug, Clone)]
pub enum WorldNotification {
    StateChanged(Arc<WorldState>),
    OutcomeApplied(Arc<NegotiationReport>),
    TurnAdvanced {
        turn: u64,
        day: u64,
    },
    ProvinceOwnerChanged {
        province: ProvinceId,
        previous: Option<FactionId>,
        current: Option<FactionId>,
    },
    GameLoaded {
        turn: u64,
    },
}

impl WorldNotification {
    pub fn label(&self) -> &'static str {
        match self {
            WorldNotification::StateChanged(_) => "state_changed",
            WorldNotification::OutcomeApplied(_) => "outcome_applied",
            WorldNotification::TurnAdvanced { .. } => "turn_advanced",
            WorldNotification::ProvinceOwnerChanged { .. } => "province_owner_changed",
            WorldNotification::GameLoaded { .. } => "game_loaded",
        }
    }
}

struct StoreInner {
    current: RwLock<Arc<WorldState>>,
    subscribers: Mutex<Vec<Sender<WorldNotification>>>,
    capacity: usize,
}

/// Holder of the single canonical [`WorldState`].
///
/// Cloning yields another handle to the same store, so readers on other threads can
/// poll [`current`](Self::current) while the owning session keeps writing. Readers get
/// an `Arc` to a complete snapshot and never block the writer for longer than a pointer
/// swap.
#[derive(Clone)]
pub struct WorldStateStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for WorldStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current();
        f.debug_struct("WorldStateStore")
            .field("turn", &current.turn)
            .field("day", &current.day)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl WorldStateStore {
    pub fn new(initial: WorldState, channel_capacity: usize) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: RwLock::new(Arc::new(initial)),
                subscribers: Mutex::new(Vec::new()),
                capacity: channel_capacity.max(1),
            }),
        }
    }

    /// The canonical state at the time of the call.
    pub fn current(&self) -> Arc<WorldState> {
        Arc::clone(&self.inner.current.read())
    }

    /// Register an observer. Dropping the receiver unsubscribes on the next publish.
    pub fn subscribe(&self) -> Receiver<WorldNotification> {
        let (sender, receiver) = bounded(self.inner.capacity);
        self.inner.subscribers.lock().push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Install `state` as canonical. Only the owning session calls this.
    pub(crate) fn replace(&self, state: WorldState) -> Arc<WorldState> {
        let next = Arc::new(state);
        *self.inner.current.write() = Arc::clone(&next);
        next
    }

    /// Fan `notification` out to every live subscriber, returning how many received it.
    pub(crate) fn publish(&self, notification: WorldNotification) -> usize {
        let label = notification.label();
        let mut delivered = 0usize;
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|sender| match sender.try_send(notification.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    target: "concord::store",
                    notification = label,
                    "notification.dropped=subscriber_full"
                );
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        debug!(
            target: "concord::store",
            notification = label,
            delivered,
            subscribers = subscribers.len(),
            "notification.published"
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn replace_swaps_snapshot_atomically() {
        let store = WorldStateStore::new(WorldState::new(1), 4);
        let before = store.current();
        let mut next = (*before).clone();
        next.turn = 2;
        store.replace(next);

        assert_eq!(before.turn, 1);
        assert_eq!(store.current().turn, 2);
    }

    #[test]
    fn clones_share_the_same_state() {
        let store = WorldStateStore::new(WorldState::new(1), 4);
        let reader = store.clone();
        let mut next = WorldState::new(1);
        next.turn = 9;
        store.replace(next);
        assert_eq!(reader.current().turn, 9);
    }

    #[test]
    fn subscribers_receive_in_publish_order() {
        let store = WorldStateStore::new(WorldState::new(1), 8);
        let receiver = store.subscribe();
        store.publish(WorldNotification::TurnAdvanced { turn: 2, day: 2 });
        store.publish(WorldNotification::GameLoaded { turn: 2 });

        let labels: Vec<_> = receiver.try_iter().map(|n| n.label()).collect();
        assert_eq!(labels, vec!["turn_advanced", "game_loaded"]);
    }

    #[test]
    fn full_subscriber_drops_but_stays_registered() {
        let store = WorldStateStore::new(WorldState::new(1), 1);
        let receiver = store.subscribe();
        assert_eq!(store.publish(WorldNotification::GameLoaded { turn: 1 }), 1);
        assert_eq!(store.publish(WorldNotification::GameLoaded { turn: 2 }), 0);
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(receiver.try_iter().count(), 1);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let store = WorldStateStore::new(WorldState::new(1), 4);
        let kept = store.subscribe();
        drop(store.subscribe());
        store.publish(WorldNotification::GameLoaded { turn: 1 });
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(kept.try_iter().count(), 1);
    }

    #[test]
    fn concurrent_readers_see_whole_states() {
        let store = WorldStateStore::new(WorldState::new(1), 4);
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reader = store.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let state = reader.current();
                        // turn and day are written together, so they always match here
                        assert_eq!(state.turn, state.day);
                    }
                })
            })
            .collect();

        for step in 2..100 {
            let mut next = WorldState::new(1);
            next.turn = step;
            next.day = step;
            store.replace(next);
        }
        for reader in readers {
            reader.join().expect("reader thread");
        }
    }
}
