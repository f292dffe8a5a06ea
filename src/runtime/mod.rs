//! Async station runtime: one task owns the station, commands in, events out.

/// Event stream types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
