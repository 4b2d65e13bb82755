//! Quizwire Protocol — the wire between host and players.
//!
//! Four logical channels carry JSON messages; each channel has a closed
//! tagged-union message type with exhaustive handling on both sides.
//! Payloads that fail to deserialize are ignored by consumers, which is
//! what makes the protocol forward-compatible: an unknown `type` tag is a
//! no-op, never an error.

pub mod bus;
pub mod channel;
pub mod message;
pub mod transport;

pub use bus::InProcessBus;
pub use channel::{Channel, Envelope};
pub use message::{
    AnswerMessage, ControlMessage, LobbyMessage, QuestionMessage, QuestionPayload, SessionConfig,
    SessionSummary, WinnerSummary,
};
pub use transport::ChannelTransport;
