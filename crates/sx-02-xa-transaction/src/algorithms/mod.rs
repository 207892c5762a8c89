//! # Algorithms Module
//!
//! The participant state machine driver and the phase barrier.

pub mod participant;
pub mod two_phase_commit;

pub use participant::XaParticipant;
pub use two_phase_commit::{run_phase, PhaseOutcome};
