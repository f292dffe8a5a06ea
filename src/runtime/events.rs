//! Runtime event stream payloads.

use crate::{engine::QsoState, types::ContactSeq};

/// Events emitted from the single-writer station loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEvent {
    /// A new slot began.
    SlotBoundary {
        /// Slot counter since the last resync.
        slot_index: u64,
        /// Parity of the new slot.
        parity: u8,
        /// The slot that ended was one of ours and the timeout tick ran.
        timed_out: bool,
    },
    /// Text is waiting for its slot.
    TxQueued {
        /// Message text.
        text: String,
        /// Parity of the slot it waits for.
        parity: u8,
    },
    /// Transmitter keyed.
    TxStarted {
        /// Message text.
        text: String,
        /// Parity of the slot being transmitted in.
        parity: u8,
        /// Symbols skipped for a late start.
        symbol_offset: u64,
    },
    /// Sequencer state or retry count changed.
    StateChanged {
        /// New state.
        state: QsoState,
        /// Status label as shown to the operator.
        label: String,
    },
    /// A contact was completed and handed to persistence.
    ContactLogged {
        /// Journal sequence.
        seq: ContactSeq,
        /// Peer callsign.
        peer_call: String,
    },
    /// Persistence has reached at least this contact sequence.
    DurableUpTo {
        /// Highest sequence known durable.
        seq: ContactSeq,
    },
}
