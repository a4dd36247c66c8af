//! Realtime push channel
//!
//! This module provides:
//! - `RealtimeChannel`: process-wide connection manager with fixed-delay reconnect
//! - `Subscription`: unsubscribe token for a channel listener
//! - `RealtimeTransport`: seam over the socket, with a WebSocket implementation

mod channel;
mod transport;

pub use channel::{
    ConnectionState, Listener, RealtimeChannel, Subscription, DEFAULT_RECONNECT_DELAY,
};
pub use transport::{MessageStream, RealtimeError, RealtimeTransport, WebSocketTransport};

#[cfg(test)]
pub(crate) mod mock;
