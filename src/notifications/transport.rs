//! Reconnecting WebSocket transport.
//!
//! One background task owns the socket for the lifetime of a `connect()`.
//! It reconnects with exponential backoff after a drop, sends a liveness
//! ping on a fixed cadence, and forces a reconnect when no inbound frame
//! arrives for twice the cadence.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::dispatch::Dispatcher;
use super::ring::EventRing;
use crate::types::{NotificationEvent, STATUS_CONNECTED, STATUS_DISCONNECTED};

const PING_FRAME: &str = r#"{"type":"ping"}"#;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Notification endpoint, `ws://` or `wss://`.
    pub url: String,
    pub connect_timeout: Duration,
    /// Liveness ping cadence; the idle cutoff is twice this.
    pub ping_interval: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws/notifications/".to_string(),
            connect_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
        }
    }
}

/// Exponential reconnect delay: base, 2x, 4x, ... capped at max.
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt.min(16));
        let delay = self.base.saturating_mul(factor).min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// State shared between the transport task and the facade.
pub(crate) struct Shared {
    pub ready_state: RwLock<ReadyState>,
    pub message_count: AtomicU64,
    pub last_message_at: RwLock<Option<DateTime<Utc>>>,
    pub reconnect_attempts: AtomicU32,
    pub shutdown: AtomicBool,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            ready_state: RwLock::new(ReadyState::Closed),
            message_count: AtomicU64::new(0),
            last_message_at: RwLock::new(None),
            reconnect_attempts: AtomicU32::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.ready_state.read().expect("ready state poisoned")
    }

    fn set_ready_state(&self, state: ReadyState) {
        *self.ready_state.write().expect("ready state poisoned") = state;
    }
}

pub(crate) enum Command {
    Ping,
}

/// Connect-and-drive loop. Runs until shutdown or until the facade aborts
/// the task.
pub(crate) async fn run(
    config: StreamConfig,
    shared: Arc<Shared>,
    dispatcher: Arc<Dispatcher>,
    ring: Arc<Mutex<EventRing>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut backoff = Backoff::new(config.backoff_base, config.backoff_max);

    loop {
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }

        let reconnecting = shared.reconnect_attempts.load(Ordering::SeqCst) > 0;
        shared.set_ready_state(if reconnecting {
            ReadyState::Reconnecting
        } else {
            ReadyState::Connecting
        });

        match timeout(config.connect_timeout, connect_async(config.url.as_str())).await {
            Ok(Ok((stream, _))) => {
                info!(url = %config.url, "notification stream connected");
                backoff.reset();
                shared.reconnect_attempts.store(0, Ordering::SeqCst);
                shared.set_ready_state(ReadyState::Open);
                dispatcher.dispatch(&NotificationEvent::connection_status(STATUS_CONNECTED));

                drive(stream, &config, &shared, &dispatcher, &ring, &mut commands).await;

                shared.set_ready_state(ReadyState::Closed);
                dispatcher.dispatch(&NotificationEvent::connection_status(STATUS_DISCONNECTED));
            }
            Ok(Err(e)) => {
                warn!(url = %config.url, "notification stream connect failed: {}", e);
            }
            Err(_) => {
                warn!(url = %config.url, "notification stream connect timed out");
            }
        }

        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }

        shared.reconnect_attempts.fetch_add(1, Ordering::SeqCst);
        let delay = backoff.next_delay();
        debug!("reconnecting in {:?}", delay);
        tokio::time::sleep(delay).await;
    }

    shared.set_ready_state(ReadyState::Closed);
}

/// Drive one open socket until it closes, errors, goes idle, or shutdown.
async fn drive(
    stream: WsStream,
    config: &StreamConfig,
    shared: &Shared,
    dispatcher: &Dispatcher,
    ring: &Mutex<EventRing>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) {
    let (mut sink, mut frames) = stream.split();
    let mut ping = interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    let idle_cutoff = config.ping_interval * 2;
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    last_frame = Instant::now();
                    handle_frame(&text, shared, dispatcher, ring);
                }
                Some(Ok(Message::Ping(data))) => {
                    last_frame = Instant::now();
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Pong(_))) => {
                    last_frame = Instant::now();
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("notification stream closed by server");
                    return;
                }
                Some(Err(e)) => {
                    warn!("notification stream error: {}", e);
                    return;
                }
                Some(Ok(_)) => {}
            },
            _ = ping.tick() => {
                if last_frame.elapsed() >= idle_cutoff {
                    warn!("no inbound frames for {:?}, forcing reconnect", idle_cutoff);
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
                let _ = sink.send(Message::Text(PING_FRAME.to_string())).await;
            },
            command = commands.recv() => match command {
                Some(Command::Ping) => {
                    let _ = sink.send(Message::Text(PING_FRAME.to_string())).await;
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            },
        }

        if shared.shutdown.load(Ordering::SeqCst) {
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    }
}

/// Decode one text frame and deliver it. Undecodable frames are dropped.
fn handle_frame(text: &str, shared: &Shared, dispatcher: &Dispatcher, ring: &Mutex<EventRing>) {
    let event: NotificationEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            debug!("dropping undecodable frame: {}", e);
            return;
        }
    };

    shared.message_count.fetch_add(1, Ordering::SeqCst);
    *shared
        .last_message_at
        .write()
        .expect("last message slot poisoned") = Some(Utc::now());

    ring.lock().expect("event ring poisoned").push(event.clone());
    dispatcher.dispatch(&event);
}
