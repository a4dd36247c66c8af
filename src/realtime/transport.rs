//! Transport behind the realtime channel

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RealtimeError {
    #[error("Failed to open realtime connection: {0}")]
    Connect(String),
    #[error("Realtime socket error: {0}")]
    Socket(String),
}

/// Inbound text frames of one connection. The stream ending means the
/// server closed the socket.
pub type MessageStream = BoxStream<'static, Result<String, RealtimeError>>;

/// Opens one connection to the notification channel.
///
/// The channel never sends outbound messages, so a transport only has to
/// yield inbound frames.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn open(&self, url: &str) -> Result<MessageStream, RealtimeError>;
}

/// WebSocket transport (`ws://` and `wss://`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl RealtimeTransport for WebSocketTransport {
    async fn open(&self, url: &str) -> Result<MessageStream, RealtimeError> {
        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| RealtimeError::Connect(e.to_string()))?;

        // Ping/pong is answered by tungstenite while the stream is polled
        let frames = socket.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(RealtimeError::Socket(e.to_string()))),
            }
        });
        Ok(frames.boxed())
    }
}
