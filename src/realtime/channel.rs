//! Process-wide realtime notification channel
//!
//! Owns at most one connection to the notification socket and fans every
//! inbound message out to its subscribers.
//!
//! ## Connection lifecycle
//!
//! ```text
//! Disconnected --connect()--> Connecting --open ok--> Connected
//!      ^                          |                      |
//!      |       open failed        |     close / error    |
//!      +--------------------------+----------------------+
//!      |
//!      +-- after `reconnect_delay` (fixed, no cap) --> Connecting
//! ```
//!
//! A single background driver task runs the loop above. `connect()` while
//! connecting or connected is a no-op; while waiting to reconnect it skips
//! the rest of the wait.
//!
//! Message content is not interpreted: any well-formed JSON payload is
//! delivered to every subscriber, in subscription order. Malformed payloads
//! are logged and dropped without touching the connection.

use super::transport::{RealtimeTransport, WebSocketTransport};
use futures::StreamExt;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay between a disconnect and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Subscriber callback, invoked on the driver task for every message
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct ChannelInner {
    url: String,
    transport: Arc<dyn RealtimeTransport>,
    reconnect_delay: Duration,
    state: watch::Sender<ConnectionState>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    driver_running: AtomicBool,
    wake: Notify,
    shutdown: CancellationToken,
}

/// Handle to the shared channel. Clones refer to the same connection.
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<ChannelInner>,
}

impl RealtimeChannel {
    pub fn new(
        url: impl Into<String>,
        transport: Arc<dyn RealtimeTransport>,
        reconnect_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ChannelInner {
                url: url.into(),
                transport,
                reconnect_delay,
                state,
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(1),
                driver_running: AtomicBool::new(false),
                wake: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Channel over a WebSocket connection to `url`
    pub fn websocket(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self::new(url, Arc::new(WebSocketTransport), reconnect_delay)
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners().len()
    }

    /// Register `handler` for every future message.
    ///
    /// The returned token unsubscribes when dropped or on
    /// [`Subscription::unsubscribe`].
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners().push((id, Arc::new(handler)));
        debug!(subscription = id, "Realtime subscriber added");
        Subscription {
            id,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Start (or hurry) the connection.
    ///
    /// Returns false when nothing happened: already connecting/connected, or
    /// the channel has been shut down.
    pub fn connect(&self) -> bool {
        if self.inner.shutdown.is_cancelled() {
            return false;
        }
        if self
            .inner
            .driver_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.state.send_replace(ConnectionState::Connecting);
            info!(url = %self.inner.url, "Creating realtime connection");
            tokio::spawn(drive(self.inner.clone()));
            return true;
        }
        if self.state() == ConnectionState::Disconnected {
            debug!("Reconnect requested during backoff");
            self.inner.wake.notify_one();
            return true;
        }
        false
    }

    /// Close the connection for good and stop reconnecting
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    #[cfg(test)]
    pub(crate) fn deliver(&self, raw: &str) {
        self.inner.dispatch(raw);
    }
}

impl ChannelInner {
    fn listeners(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove_listener(&self, id: u64) {
        self.listeners().retain(|(lid, _)| *lid != id);
        debug!(subscription = id, "Realtime subscriber removed");
    }

    fn dispatch(&self, raw: &str) {
        let payload: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, raw, "Invalid realtime message ignored");
                return;
            }
        };
        // Snapshot so handlers may subscribe/unsubscribe without deadlocking
        let listeners: Vec<Listener> = self.listeners().iter().map(|(_, l)| l.clone()).collect();
        debug!(subscribers = listeners.len(), "Realtime message received");
        for listener in listeners {
            listener(&payload);
        }
    }

    /// Connection loop. Returns only on shutdown.
    async fn run(&self) {
        loop {
            self.state.send_replace(ConnectionState::Connecting);
            let opened = tokio::select! {
                _ = self.shutdown.cancelled() => return,
                opened = self.transport.open(&self.url) => opened,
            };

            match opened {
                Ok(mut frames) => {
                    self.state.send_replace(ConnectionState::Connected);
                    info!(url = %self.url, "Realtime connected");
                    loop {
                        let frame = tokio::select! {
                            _ = self.shutdown.cancelled() => return,
                            frame = frames.next() => frame,
                        };
                        match frame {
                            Some(Ok(text)) => self.dispatch(&text),
                            Some(Err(e)) => {
                                warn!(error = %e, "Realtime connection failed");
                                break;
                            }
                            None => {
                                info!("Realtime disconnected");
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!(url = %self.url, error = %e, "Realtime connection failed"),
            }

            self.state.send_replace(ConnectionState::Disconnected);
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = self.wake.notified() => {}
            }
            debug!("Reconnecting realtime channel");
        }
    }
}

async fn drive(inner: Arc<ChannelInner>) {
    inner.run().await;
    inner.state.send_replace(ConnectionState::Disconnected);
    inner.driver_running.store(false, Ordering::SeqCst);
    info!(url = %inner.url, "Realtime channel shut down");
}

/// Unsubscribe token returned by [`RealtimeChannel::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    channel: Weak<ChannelInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            inner.remove_listener(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
