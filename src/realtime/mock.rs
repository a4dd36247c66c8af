//! Scripted realtime transport for testing the channel without a socket server.

use super::transport::{MessageStream, RealtimeError, RealtimeTransport};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What the next `open()` does
enum Script {
    Refuse,
    Hang,
    Accept(mpsc::UnboundedReceiver<Result<String, RealtimeError>>),
}

/// Server side of one accepted connection. Dropping it closes the socket.
pub struct ServerSession {
    tx: mpsc::UnboundedSender<Result<String, RealtimeError>>,
}

impl ServerSession {
    pub fn send(&self, raw: &str) {
        let _ = self.tx.send(Ok(raw.to_string()));
    }

    pub fn fail(&self, reason: &str) {
        let _ = self.tx.send(Err(RealtimeError::Socket(reason.to_string())));
    }

    pub fn close(self) {}
}

/// Transport that plays back queued connection outcomes in order.
/// Once the queue is empty every further attempt is refused.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    opens: AtomicUsize,
    open_times: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_session(&self) -> ServerSession {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scripts.lock().unwrap().push_back(Script::Accept(rx));
        ServerSession { tx }
    }

    pub fn push_refusal(&self) {
        self.scripts.lock().unwrap().push_back(Script::Refuse);
    }

    /// Next open never completes
    pub fn push_hang(&self) {
        self.scripts.lock().unwrap().push_back(Script::Hang);
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.open_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl RealtimeTransport for ScriptedTransport {
    async fn open(&self, url: &str) -> Result<MessageStream, RealtimeError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open_times.lock().unwrap().push(Instant::now());
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Accept(rx)) => Ok(futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|frame| (frame, rx))
            })
            .boxed()),
            Some(Script::Hang) => futures::future::pending().await,
            Some(Script::Refuse) | None => Err(RealtimeError::Connect(format!(
                "connection refused: {}",
                url
            ))),
        }
    }
}
