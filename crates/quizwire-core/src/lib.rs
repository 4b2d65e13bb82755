//! Quizwire Core — shared kernel.
//!
//! Defines the abstractions every other crate depends on: the clock and
//! randomness seams, the common error type, and the archive gateway
//! through which live sessions are mirrored into historical storage.
//! No game logic and no infrastructure code lives here.

pub mod archive;
pub mod clock;
pub mod error;
pub mod rng;
