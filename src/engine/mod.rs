//! The auto-sequencing protocol engine.

/// Sequencer context and operations.
pub mod sequencer;
/// Protocol states.
pub mod state;
/// Dispatch and timeout tables.
pub mod table;

pub use sequencer::{AutoSequencer, QsoContext, SequencerOptions};
pub use state::QsoState;
