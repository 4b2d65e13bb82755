//! Logical channel names and the delivery envelope.

use serde::{Deserialize, Serialize};

/// The four logical topics of a trivia session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Join/leave announcements, player → everyone, host consumes.
    Lobby,
    /// Question broadcasts, host → players.
    Questions,
    /// Answer submissions and per-answer feedback, both directions.
    Answers,
    /// Session lifecycle control and late-join recovery.
    GameControl,
}

impl Channel {
    /// Every channel, in a fixed order. Convenient for subscribing to the
    /// full session.
    pub const ALL: [Self; 4] = [Self::Lobby, Self::Questions, Self::Answers, Self::GameControl];

    /// The transport-level topic name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lobby => "trivia-lobby",
            Self::Questions => "trivia-questions",
            Self::Answers => "trivia-answers",
            Self::GameControl => "trivia-game-control",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One delivered message: the channel it arrived on and its raw payload.
///
/// Consumers deserialize the payload against their channel's message enum
/// and drop anything that does not parse.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// The channel the payload was published on.
    pub channel: Channel,
    /// The JSON payload as published.
    pub payload: serde_json::Value,
}
