//! The transport seam.
//!
//! Delivery semantics the state machines are written against: at-least-once,
//! FIFO per publishing channel, no ordering across channels. Connection
//! lifecycle, presence, and retries belong to the implementation behind
//! this trait, not to the session protocol.

use async_trait::async_trait;
use quizwire_core::error::QuizError;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::channel::{Channel, Envelope};

/// Publish/subscribe delivery over named logical channels.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Publishes a JSON payload on a channel.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Transport`] when delivery fails. Callers treat
    /// the message as lost (not queued) and keep the session running.
    async fn publish(&self, channel: Channel, payload: serde_json::Value)
    -> Result<(), QuizError>;

    /// Subscribes to a set of channels, returning a stream of envelopes.
    ///
    /// Each subscription is an independent consumer: every subscriber sees
    /// every message on its channels, including the subscriber's own
    /// publishes (the transport is a broadcast medium, not a queue).
    fn subscribe(&self, channels: &[Channel]) -> UnboundedReceiver<Envelope>;
}
