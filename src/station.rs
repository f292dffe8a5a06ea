//! One station's control loop: decodes in, transmit text out, with the
//! sequencer and slot scheduler wired together.

use tracing::{debug, warn};

use crate::{
    config::{ConfigError, StationConfig},
    decode::DecodedRecord,
    engine::{AutoSequencer, QsoState},
    log::{
        StoredContact,
        worked::{LogEntry, LogPager},
    },
    scheduler::{SlotScheduler, SlotUpdate},
    text::{LineText, MessageText},
};

/// Error returned by [`Station`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationError {
    /// Selected index is outside the last decode batch.
    NoSuchDecode(usize),
}

/// How a decoded line should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeHighlight {
    /// Traffic between other stations.
    Plain,
    /// CQ from a station not yet worked.
    GeneralCall,
    /// CQ from a station already in the worked list.
    WorkedCall,
    /// Message addressed to us.
    AddressedToMe,
}

/// A transmission that keys up now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// Message text.
    pub text: MessageText,
    /// Parity of the slot being transmitted in.
    pub parity: u8,
    /// Symbols to skip for a late start.
    pub symbol_offset: u64,
}

/// Result of one [`Station::poll`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollOutcome {
    /// What the slot clock did.
    pub slot: SlotUpdate,
    /// Set when the queued text keys up in this poll.
    pub transmission: Option<Transmission>,
}

/// Queued and on-air text, for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxStatus {
    /// Text waiting for its slot.
    pub queued: Option<MessageText>,
    /// Text going out in the current slot.
    pub on_air: Option<MessageText>,
    /// Parity the queued text waits for.
    pub target_parity: u8,
}

/// Point-in-time view of a station, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationStatus {
    /// Sequencer state.
    pub state: QsoState,
    /// Status label, see [`Station::state_label`].
    pub label: LineText,
    /// Station being worked.
    pub peer_call: String,
    /// Queued and on-air text.
    pub tx: TxStatus,
    /// Slots since the last resync.
    pub slot_index: u64,
    /// Parity of the current slot.
    pub parity: u8,
}

/// A station: sequencer, slot scheduler and the text between them.
#[derive(Debug)]
pub struct Station {
    config: StationConfig,
    sequencer: AutoSequencer,
    scheduler: SlotScheduler,
    queued: Option<MessageText>,
    on_air: Option<MessageText>,
    last_decodes: Vec<DecodedRecord>,
    pager: LogPager,
}

impl Station {
    /// Validates `config` and builds an idle station whose slot 0 starts at `now_ms`.
    pub fn new(config: StationConfig, now_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut sequencer = AutoSequencer::new(config.sequencer_options());
        sequencer.initialize(&config.callsign, &config.grid);
        Ok(Self {
            scheduler: SlotScheduler::new(config.slot, now_ms),
            pager: LogPager::new(config.log.page_rows),
            sequencer,
            queued: None,
            on_air: None,
            last_decodes: Vec::new(),
            config,
        })
    }

    /// Validated configuration.
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// The contact state machine.
    pub fn sequencer(&self) -> &AutoSequencer {
        &self.sequencer
    }

    /// The slot clock.
    pub fn scheduler(&self) -> &SlotScheduler {
        &self.scheduler
    }

    /// Decodes from the last processed batch.
    pub fn last_decodes(&self) -> &[DecodedRecord] {
        &self.last_decodes
    }

    /// Feeds one decode cycle's records. Returns whether a transmission got queued.
    ///
    /// At most one batch is sequenced per slot, and none while we transmit.
    pub fn on_decodes(&mut self, records: Vec<DecodedRecord>) -> bool {
        if self.scheduler.is_transmitting() || self.scheduler.decoded_this_slot() {
            debug!(count = records.len(), "decode batch outside receive window");
            return false;
        }
        self.scheduler.mark_decoded();
        self.last_decodes = records;

        let mut reply_parity = None;
        for record in &self.last_decodes {
            if self.sequencer.on_decode(record) {
                reply_parity = Some(record.reply_slot());
                break;
            }
        }
        if let Some(parity) = reply_parity {
            return self.queue_next(parity);
        }

        if !self.scheduler.is_pending() && self.sequencer.context().next_tx().is_some() {
            // Repeat, or the fallback armed by the last timeout.
            let parity = self.scheduler.target_parity();
            return self.queue_next(parity);
        }

        // Nothing armed, whatever the state: a late 73 can leave us in Calling.
        if self.sequencer.options().beacon
            && !self.scheduler.is_pending()
            && self.sequencer.context().next_tx().is_none()
        {
            self.sequencer.start_general_call();
            let parity = self.scheduler.current_parity() ^ 1;
            return self.queue_next(parity);
        }

        false
    }

    /// Operator picked decode `index` of the last batch.
    pub fn select(&mut self, index: usize) -> Result<bool, StationError> {
        let Some(record) = self.last_decodes.get(index).cloned() else {
            warn!(index, available = self.last_decodes.len(), "selection outside decode list");
            return Err(StationError::NoSuchDecode(index));
        };
        if !self.sequencer.on_select(&record) {
            return Ok(false);
        }
        Ok(self.queue_next(record.reply_slot()))
    }

    /// Starts calling CQ in the next slot.
    pub fn start_cq(&mut self) -> bool {
        self.sequencer.start_general_call();
        let parity = self.scheduler.current_parity() ^ 1;
        self.queue_next(parity)
    }

    /// Drops the contact in progress and anything queued.
    pub fn abort(&mut self) {
        self.sequencer
            .initialize(&self.config.callsign, &self.config.grid);
        self.scheduler.cancel();
        self.queued = None;
        debug!("station aborted");
    }

    /// Turns unattended operation on or off.
    pub fn set_beacon(&mut self, beacon: bool) {
        self.config.beacon = beacon;
        self.sequencer.set_beacon(beacon);
    }

    /// Re-aligns the slot clock to `now_ms`.
    pub fn resync(&mut self, now_ms: u64) {
        self.scheduler.resync(now_ms);
        self.on_air = None;
    }

    /// Advances the slot clock. Call often; at least every few symbols.
    pub fn poll(&mut self, now_ms: u64) -> PollOutcome {
        let slot = self.scheduler.update(now_ms, &mut self.sequencer);
        if slot.boundary.is_some() {
            self.on_air = None;
        }

        let transmission = slot.started.and_then(|start| {
            let text = self.queued.take()?;
            self.on_air = Some(text.clone());
            Some(Transmission {
                text,
                parity: start.parity,
                symbol_offset: start.symbol_offset,
            })
        });

        PollOutcome { slot, transmission }
    }

    /// Sequencer status label, empty while idle.
    pub fn state_label(&self) -> LineText {
        self.sequencer.state_label()
    }

    /// Queued and on-air text.
    pub fn tx_status(&self) -> TxStatus {
        TxStatus {
            queued: self.queued.clone(),
            on_air: self.on_air.clone(),
            target_parity: self.scheduler.target_parity(),
        }
    }

    /// Point-in-time view for display.
    pub fn status(&self) -> StationStatus {
        StationStatus {
            state: self.sequencer.state(),
            label: self.state_label(),
            peer_call: self.sequencer.context().peer_call().to_string(),
            tx: self.tx_status(),
            slot_index: self.scheduler.slot_index(),
            parity: self.scheduler.current_parity(),
        }
    }

    /// Next page of the worked list; `None` wraps the pager back to the first page.
    pub fn next_log_page(&mut self) -> Option<Vec<LogEntry>> {
        self.pager.next_page(self.sequencer.worked_log())
    }

    /// How `record` should be shown.
    pub fn highlight(&self, record: &DecodedRecord) -> DecodeHighlight {
        if self.sequencer.identity().is(&record.addressee) {
            DecodeHighlight::AddressedToMe
        } else if record.general_call {
            if self.sequencer.worked_log().worked_before(&record.sender) {
                DecodeHighlight::WorkedCall
            } else {
                DecodeHighlight::GeneralCall
            }
        } else {
            DecodeHighlight::Plain
        }
    }

    /// Strongest CQ in the last batch from a station not yet worked.
    pub fn best_cq_candidate(&self) -> Option<usize> {
        self.last_decodes
            .iter()
            .enumerate()
            .filter(|(_, r)| self.highlight(r) == DecodeHighlight::GeneralCall)
            .max_by_key(|(_, r)| r.snr)
            .map(|(i, _)| i)
    }

    /// Continues contact numbering after a reopened journal's last sequence.
    pub fn resume_contact_seq(&mut self, last_seq: crate::types::ContactSeq) {
        self.sequencer.resume_contact_seq(last_seq);
    }

    /// Contacts completed since the last call.
    pub fn drain_contacts(&mut self) -> Vec<StoredContact> {
        self.sequencer.drain_contacts()
    }

    fn queue_next(&mut self, parity: u8) -> bool {
        let Some(text) = self.sequencer.next_transmission_text() else {
            self.scheduler.cancel();
            self.queued = None;
            return false;
        };
        debug!(text = %text, parity, "queued");
        self.scheduler.arm(parity);
        self.queued = Some(text);
        true
    }
}
