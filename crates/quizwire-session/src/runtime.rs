//! Serialized event loops for the two state machines.
//!
//! Messages arrive from many players concurrently; correctness of the
//! overwrite-on-resubmit and fastest-so-far logic depends on handlers
//! running to completion one at a time. Each runtime is that guarantee:
//! a single consumer merging host/player commands with inbound envelopes,
//! driving its state machine without any parallel mutation.

use quizwire_protocol::{Channel, ChannelTransport, Envelope};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::orchestrator::Orchestrator;
use crate::player::PlayerSession;

/// Commands the host UI sends into the orchestrator's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Configure and start a session.
    Configure {
        /// How many questions to ask.
        question_count: u32,
    },
    /// Open the next question (or complete the session).
    AskNext,
    /// Close the open question.
    CloseQuestion,
    /// Clear the closed question.
    Advance,
    /// Complete the session with standings.
    Complete,
    /// Terminate without standings.
    Stop,
    /// Exit the event loop.
    Shutdown,
}

/// The orchestrator's event loop: host commands and inbound envelopes,
/// one at a time.
pub struct HostRuntime {
    orchestrator: Orchestrator,
    inbox: UnboundedReceiver<Envelope>,
    commands: UnboundedReceiver<HostCommand>,
}

impl HostRuntime {
    /// Subscribes the orchestrator to its channels and returns the runtime
    /// plus the command handle.
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        transport: &dyn ChannelTransport,
    ) -> (Self, UnboundedSender<HostCommand>) {
        let inbox =
            transport.subscribe(&[Channel::Lobby, Channel::Answers, Channel::GameControl]);
        let (tx, commands) = mpsc::unbounded_channel();
        (
            Self {
                orchestrator,
                inbox,
                commands,
            },
            tx,
        )
    }

    /// Runs until shutdown or until both sources close, returning the
    /// orchestrator for inspection.
    pub async fn run(mut self) -> Orchestrator {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(HostCommand::Shutdown) => break,
                    Some(command) => dispatch_host_command(&mut self.orchestrator, command).await,
                },
                envelope = self.inbox.recv() => match envelope {
                    None => break,
                    Some(envelope) => self.orchestrator.handle_envelope(envelope).await,
                },
            }
        }
        self.orchestrator
    }
}

/// Applies one host command; rejections are logged, never fatal.
async fn dispatch_host_command(orchestrator: &mut Orchestrator, command: HostCommand) {
    let result = match command {
        HostCommand::Configure { question_count } => orchestrator.configure(question_count).await,
        HostCommand::AskNext => orchestrator.ask_next().await,
        HostCommand::CloseQuestion => orchestrator.close_question().await,
        HostCommand::Advance => orchestrator.advance(),
        HostCommand::Complete => orchestrator.complete().await,
        HostCommand::Stop => orchestrator.stop().await,
        HostCommand::Shutdown => Ok(()),
    };
    if let Err(e) = result {
        tracing::warn!(?command, error = %e, "host command rejected");
    }
}

/// Commands the player UI sends into the player's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Announce and request session state.
    Join,
    /// Answer the active question.
    SelectAnswer {
        /// Chosen option index.
        answer_index: usize,
    },
    /// Announce departure and reset.
    Leave,
    /// Exit the event loop.
    Shutdown,
}

/// The player session's event loop.
pub struct PlayerRuntime {
    player: PlayerSession,
    inbox: UnboundedReceiver<Envelope>,
    commands: UnboundedReceiver<PlayerCommand>,
}

impl PlayerRuntime {
    /// Subscribes the player to its channels and returns the runtime plus
    /// the command handle.
    #[must_use]
    pub fn new(
        player: PlayerSession,
        transport: &dyn ChannelTransport,
    ) -> (Self, UnboundedSender<PlayerCommand>) {
        let inbox =
            transport.subscribe(&[Channel::Questions, Channel::Answers, Channel::GameControl]);
        let (tx, commands) = mpsc::unbounded_channel();
        (
            Self {
                player,
                inbox,
                commands,
            },
            tx,
        )
    }

    /// Runs until shutdown or until both sources close, returning the
    /// player session for inspection.
    pub async fn run(mut self) -> PlayerSession {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(PlayerCommand::Shutdown) => break,
                    Some(PlayerCommand::Join) => self.player.join().await,
                    Some(PlayerCommand::SelectAnswer { answer_index }) => {
                        self.player.select_answer(answer_index).await;
                    }
                    Some(PlayerCommand::Leave) => self.player.leave().await,
                },
                envelope = self.inbox.recv() => match envelope {
                    None => break,
                    Some(envelope) => self.player.handle_envelope(envelope).await,
                },
            }
        }
        self.player
    }
}
