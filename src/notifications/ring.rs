use std::collections::VecDeque;

use crate::types::NotificationEvent;

/// Default retention: the 10 most recent events.
pub const RING_CAPACITY: usize = 10;

/// Bounded FIFO of the most recent notification events. Older events are
/// evicted from the front once the capacity is reached.
#[derive(Debug)]
pub struct EventRing {
    events: VecDeque<NotificationEvent>,
    capacity: usize,
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: NotificationEvent) {
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Snapshot in arrival order, oldest first.
    pub fn snapshot(&self) -> Vec<NotificationEvent> {
        self.events.iter().cloned().collect()
    }
}

impl Default for EventRing {
    fn default() -> Self {
        Self::new(RING_CAPACITY)
    }
}
