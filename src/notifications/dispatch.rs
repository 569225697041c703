use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::types::NotificationEvent;

pub type Listener = Arc<dyn Fn(&NotificationEvent) + Send + Sync + 'static>;

/// Multicast registry for notification listeners. Delivery is synchronous,
/// in registration order, and a panicking listener does not stop delivery
/// to the rest.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Listener) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .push((id, listener));
        id
    }

    pub fn remove(&self, id: u64) {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fan an event out to every listener. The registry lock is not held
    /// during callbacks, so a listener may add or remove listeners.
    pub fn dispatch(&self, event: &NotificationEvent) {
        let listeners: Vec<(u64, Listener)> = self
            .listeners
            .lock()
            .expect("listener registry poisoned")
            .clone();

        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(listener = id, "notification listener panicked");
            }
        }
    }
}
