//! Recording `ChannelTransport` double.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use quizwire_core::error::QuizError;
use quizwire_protocol::{Channel, ChannelTransport, Envelope};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A transport that records every publish instead of delivering it.
///
/// Subscriptions return open-but-silent streams (held senders keep them
/// alive), so runtimes under test stay parked on their inboxes. Flip
/// `set_failing(true)` to make every publish fail, for degraded-connection
/// tests.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<(Channel, serde_json::Value)>>,
    subscribers: Mutex<Vec<UnboundedSender<Envelope>>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    /// Creates an empty recording transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of every recorded publish, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<(Channel, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }

    /// Recorded payloads for one channel, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published_on(&self, channel: Channel) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Recorded payloads for one channel, parsed as `T`; payloads that do
    /// not parse are skipped.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn decoded_on<T: serde::de::DeserializeOwned>(&self, channel: Channel) -> Vec<T> {
        self.published_on(channel)
            .into_iter()
            .filter_map(|payload| serde_json::from_value(payload).ok())
            .collect()
    }
}

#[async_trait]
impl ChannelTransport for RecordingTransport {
    async fn publish(
        &self,
        channel: Channel,
        payload: serde_json::Value,
    ) -> Result<(), QuizError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(QuizError::Transport("transport is down".to_owned()));
        }
        self.published.lock().unwrap().push((channel, payload));
        Ok(())
    }

    fn subscribe(&self, _channels: &[Channel]) -> UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}
