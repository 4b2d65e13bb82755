//! In-process loopback transport.
//!
//! A broadcast fan-out for single-process deployments (host and players in
//! one binary) and for end-to-end tests. Mirrors the delivery semantics of
//! the hosted pub/sub service: every subscriber sees every message on its
//! channels, publishers hear their own traffic, and a slow subscriber that
//! falls behind the ring buffer loses messages rather than blocking anyone.

use async_trait::async_trait;
use quizwire_core::error::QuizError;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::channel::{Channel, Envelope};
use crate::transport::ChannelTransport;

/// Broadcast-backed [`ChannelTransport`] for a single process.
#[derive(Debug)]
pub struct InProcessBus {
    tx: broadcast::Sender<Envelope>,
}

impl InProcessBus {
    /// Creates a bus retaining up to `capacity` undelivered messages per
    /// subscriber before old ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for InProcessBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChannelTransport for InProcessBus {
    async fn publish(
        &self,
        channel: Channel,
        payload: serde_json::Value,
    ) -> Result<(), QuizError> {
        // A send error only means no subscriber exists right now; on a
        // pub/sub medium that is a successful publish into the void.
        let _ = self.tx.send(Envelope { channel, payload });
        Ok(())
    }

    fn subscribe(&self, channels: &[Channel]) -> UnboundedReceiver<Envelope> {
        let mut rx = self.tx.subscribe();
        let wanted: Vec<Channel> = channels.to_vec();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if wanted.contains(&envelope.channel)
                            && out_tx.send(envelope).is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "bus subscriber lagged, messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        out_rx
    }
}
