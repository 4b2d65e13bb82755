//! Shared test doubles for the quizwire crates.

mod archive;
mod clock;
mod rng;
mod transport;

pub use archive::{ArchiveCall, FailingArchive, RecordingArchive};
pub use clock::{FixedClock, SteppingClock};
pub use rng::{SequenceRng, ZeroRng};
pub use transport::RecordingTransport;
