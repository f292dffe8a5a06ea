//! Half-duplex slot clock: detects slot boundaries, fires the timeout tick
//! after our own transmissions and decides when an armed message may key up.

/// Clock sources.
pub mod clock;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub use clock::{ManualClock, SlotClock, SystemClock};

/// Receives the slot timeout after a transmit slot ends.
pub trait TimeoutHandler {
    /// Called once per unanswered transmit slot.
    fn on_slot_timeout(&mut self);
}

/// Slot timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Length of one slot.
    pub period_ms: u64,
    /// Length of one channel symbol.
    pub symbol_ms: u64,
    /// A transmission may still start during this many symbols into its slot.
    pub tx_window_symbols: u64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            period_ms: 15_000,
            symbol_ms: 160,
            tx_window_symbols: 29,
        }
    }
}

/// Transmission that was just allowed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxStart {
    /// Parity of the slot being transmitted in.
    pub parity: u8,
    /// Symbols already elapsed in the slot; a late start skips these.
    pub symbol_offset: u64,
}

/// Outcome of one [`SlotScheduler::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotUpdate {
    /// Parity of the new slot, when a boundary was crossed.
    pub boundary: Option<u8>,
    /// True when the boundary followed one of our transmit slots.
    pub timed_out: bool,
    /// Set when the armed message keys up now.
    pub started: Option<TxStart>,
}

/// Tracks the alternating 15 s slots against an injected clock.
#[derive(Debug, Clone)]
pub struct SlotScheduler {
    config: SlotConfig,
    epoch_ms: u64,
    slot_index: u64,
    transmitting: bool,
    pending: bool,
    target_parity: u8,
    decoded: bool,
}

impl SlotScheduler {
    /// Scheduler with slot 0 starting at `now_ms`.
    pub fn new(config: SlotConfig, now_ms: u64) -> Self {
        let mut scheduler = Self {
            config: SlotConfig {
                period_ms: config.period_ms.max(1),
                symbol_ms: config.symbol_ms.max(1),
                ..config
            },
            epoch_ms: now_ms,
            slot_index: 0,
            transmitting: false,
            pending: false,
            target_parity: 0,
            decoded: false,
        };
        scheduler.resync(now_ms);
        scheduler
    }

    /// Effective timing, after clamping.
    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    /// Re-aligns slot 0 to start at `now_ms`.
    pub fn resync(&mut self, now_ms: u64) {
        self.epoch_ms = now_ms;
        self.slot_index = 0;
        self.transmitting = false;
        self.decoded = false;
    }

    /// Parity of the current slot.
    pub fn current_parity(&self) -> u8 {
        (self.slot_index % 2) as u8
    }

    /// Slots since the last resync.
    pub fn slot_index(&self) -> u64 {
        self.slot_index
    }

    /// Queues a transmission for the next slot with `parity`.
    pub fn arm(&mut self, parity: u8) {
        self.pending = true;
        self.target_parity = parity & 1;
    }

    /// Drops a queued transmission. One already on air finishes its slot.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// True while an armed transmission waits for its slot.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Parity the armed transmission waits for.
    pub fn target_parity(&self) -> u8 {
        self.target_parity
    }

    /// True while we transmit in the current slot.
    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    /// Records that this slot's decodes were processed.
    pub fn mark_decoded(&mut self) {
        self.decoded = true;
    }

    /// True once this slot's decodes were processed.
    pub fn decoded_this_slot(&self) -> bool {
        self.decoded
    }

    /// Advances to `now_ms`: handles a slot boundary and starts an armed
    /// transmission if its slot is current and still early enough.
    pub fn update<H: TimeoutHandler>(&mut self, now_ms: u64, handler: &mut H) -> SlotUpdate {
        let mut update = SlotUpdate::default();
        let elapsed = now_ms.saturating_sub(self.epoch_ms);
        let index = elapsed / self.config.period_ms;

        if index != self.slot_index {
            self.slot_index = index;
            let parity = self.current_parity();
            update.boundary = Some(parity);
            if self.transmitting {
                handler.on_slot_timeout();
                update.timed_out = true;
            }
            self.transmitting = false;
            self.decoded = false;
            trace!(slot = index, parity, timed_out = update.timed_out, "slot boundary");
        }

        let symbol_offset = (elapsed % self.config.period_ms) / self.config.symbol_ms;
        if self.pending
            && self.target_parity == self.current_parity()
            && symbol_offset < self.config.tx_window_symbols
        {
            self.pending = false;
            self.transmitting = true;
            update.started = Some(TxStart {
                parity: self.target_parity,
                symbol_offset,
            });
        }

        update
    }
}
