//! Notification stream client.
//!
//! Three pieces, kept separable so tests can substitute each: a
//! reconnecting transport, a bounded retention ring, and a multicast
//! dispatcher. This facade composes them behind the public contract and
//! guarantees at most one live socket per instance.

pub mod dispatch;
pub mod ring;
pub mod transport;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::types::{NotificationEvent, STATUS_DISCONNECTED};

use dispatch::{Dispatcher, Listener};
use ring::EventRing;
use transport::{Command, ReadyState, Shared, StreamConfig};

pub use transport::{Backoff, ReadyState as StreamReadyState, StreamConfig as NotificationConfig};

/// Introspection snapshot for the debug surface.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStatus {
    pub ready_state: ReadyState,
    pub message_count: u64,
    pub last_message_at: Option<DateTime<Utc>>,
    pub reconnect_attempts: u32,
}

/// Removal token returned by `add_listener`. Dropping it does nothing; call
/// `remove` to unsubscribe.
pub struct ListenerHandle {
    dispatcher: Arc<Dispatcher>,
    id: u64,
}

impl ListenerHandle {
    pub fn remove(self) {
        self.dispatcher.remove(self.id);
    }
}

pub struct NotificationStream {
    config: StreamConfig,
    shared: Arc<Shared>,
    dispatcher: Arc<Dispatcher>,
    ring: Arc<Mutex<EventRing>>,
    task: Mutex<Option<JoinHandle<()>>>,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl NotificationStream {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            dispatcher: Arc::new(Dispatcher::new()),
            ring: Arc::new(Mutex::new(EventRing::default())),
            task: Mutex::new(None),
            commands: Mutex::new(None),
        }
    }

    /// Open the stream. Idempotent: a second call while the transport task
    /// is alive does nothing, so there is never more than one socket.
    pub fn connect(&self) {
        let mut task = self.task.lock().expect("transport task slot poisoned");
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }

        self.shared.shutdown.store(false, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        *self.commands.lock().expect("command slot poisoned") = Some(tx);

        *task = Some(tokio::spawn(transport::run(
            self.config.clone(),
            Arc::clone(&self.shared),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.ring),
            rx,
        )));
    }

    /// Close the stream and suppress further auto-reconnects.
    pub fn disconnect(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        *self.commands.lock().expect("command slot poisoned") = None;

        let was_open = self.shared.ready_state() == ReadyState::Open;
        if let Some(handle) = self
            .task
            .lock()
            .expect("transport task slot poisoned")
            .take()
        {
            handle.abort();
        }

        *self
            .shared
            .ready_state
            .write()
            .expect("ready state poisoned") = ReadyState::Closed;
        if was_open {
            self.dispatcher
                .dispatch(&NotificationEvent::connection_status(STATUS_DISCONNECTED));
        }
    }

    /// True iff the underlying socket is currently open.
    pub fn is_connected(&self) -> bool {
        self.shared.ready_state() == ReadyState::Open
    }

    /// Subscribe to all decoded inbound events plus the synthetic
    /// `connection_status` events. Future events only, no replay.
    pub fn add_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let id = self.dispatcher.add(listener);
        ListenerHandle {
            dispatcher: Arc::clone(&self.dispatcher),
            id,
        }
    }

    /// Emit a ping frame; silently a no-op when not connected.
    pub fn send_ping(&self) {
        if !self.is_connected() {
            return;
        }
        if let Some(tx) = self
            .commands
            .lock()
            .expect("command slot poisoned")
            .as_ref()
        {
            let _ = tx.send(Command::Ping);
        }
    }

    pub fn status(&self) -> StreamStatus {
        StreamStatus {
            ready_state: self.shared.ready_state(),
            message_count: self.shared.message_count.load(Ordering::SeqCst),
            last_message_at: *self
                .shared
                .last_message_at
                .read()
                .expect("last message slot poisoned"),
            reconnect_attempts: self.shared.reconnect_attempts.load(Ordering::SeqCst),
        }
    }

    /// The retained ring of recent events, oldest first.
    pub fn recent_events(&self) -> Vec<NotificationEvent> {
        self.ring.lock().expect("event ring poisoned").snapshot()
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self
            .task
            .lock()
            .expect("transport task slot poisoned")
            .take()
        {
            handle.abort();
        }
    }
}
