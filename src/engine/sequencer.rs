use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::{
    decode::DecodedRecord,
    log::{
        ContactRecord, StoredContact,
        worked::{DEFAULT_CAPACITY, LogEntry, WorkedLog},
    },
    message::{CqMessage, FormatContext, MessageKind, classify, format_message, is_grid_locator},
    scheduler::TimeoutHandler,
    text::{Callsign, LineText, Locator, MessageText, bounded, bounded_upper, format_bounded},
    types::{Band, ContactSeq, Report, StationIdentity},
};

use super::{
    state::QsoState,
    table::{Action, Retry, dispatch, override_state, timeout_policy},
};

/// Default number of times an unanswered message is repeated.
pub const DEFAULT_RETRY_CAP: u8 = 2;

/// Peer placeholder while calling CQ.
const CQ_PEER: &str = "CQ";

/// Operating options that shape the sequencer's decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerOptions {
    /// Repeats of an unanswered message before giving up.
    pub retry_cap: u8,
    /// Unattended mode: answer callers even when idle.
    pub beacon: bool,
    /// Answer a CQ with a report instead of our grid.
    pub skip_grid: bool,
    /// Band recorded with logged contacts.
    pub band: Band,
    /// CQ flavour.
    pub cq: CqMessage,
    /// Worked-list capacity.
    pub log_capacity: usize,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            retry_cap: DEFAULT_RETRY_CAP,
            beacon: false,
            skip_grid: false,
            band: Band::default(),
            cq: CqMessage::default(),
            log_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// State of the one contact in progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QsoContext {
    state: QsoState,
    next_tx: Option<MessageKind>,
    last_received: Option<MessageKind>,
    peer_call: Callsign,
    peer_grid: Locator,
    report_to_send: Report,
    sent_report: Report,
    received_report: Report,
    retry_count: u8,
    retry_limit: u8,
    logged: bool,
}

impl QsoContext {
    /// Current contact state.
    pub fn state(&self) -> QsoState {
        self.state
    }

    /// Message armed for the next transmission.
    pub fn next_tx(&self) -> Option<MessageKind> {
        self.next_tx
    }

    /// Classification of the last message processed.
    pub fn last_received(&self) -> Option<MessageKind> {
        self.last_received
    }

    /// Callsign of the station being worked, `"CQ"` while calling.
    pub fn peer_call(&self) -> &str {
        &self.peer_call
    }

    /// Peer locator, empty until received.
    pub fn peer_grid(&self) -> &str {
        &self.peer_grid
    }

    /// SNR we report to the peer.
    pub fn report_to_send(&self) -> Report {
        self.report_to_send
    }

    /// Last report actually rendered into a TX2/TX3.
    pub fn sent_report(&self) -> Report {
        self.sent_report
    }

    /// Report the peer gave us.
    pub fn received_report(&self) -> Report {
        self.received_report
    }

    /// Repeats already booked for the armed message.
    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Repeats allowed in this state.
    pub fn retry_limit(&self) -> u8 {
        self.retry_limit
    }

    /// True once this contact has been logged.
    pub fn logged(&self) -> bool {
        self.logged
    }
}

/// FT8 auto-sequencer: decides what to send next in a contact.
///
/// Every operation runs to completion; the caller guarantees that
/// decodes, selections and ticks are sequenced, never interleaved.
#[derive(Debug)]
pub struct AutoSequencer {
    options: SequencerOptions,
    identity: StationIdentity,
    ctx: QsoContext,
    worked: WorkedLog,
    pending_contacts: Vec<StoredContact>,
    next_contact_seq: ContactSeq,
}

impl Default for AutoSequencer {
    fn default() -> Self {
        Self::new(SequencerOptions::default())
    }
}

impl AutoSequencer {
    /// Idle sequencer with an empty worked list sized by `options`.
    pub fn new(options: SequencerOptions) -> Self {
        Self {
            worked: WorkedLog::with_capacity(options.log_capacity),
            options,
            identity: StationIdentity::default(),
            ctx: QsoContext::default(),
            pending_contacts: Vec::new(),
            next_contact_seq: 1,
        }
    }

    /// Resets the contact and sets our identity. Safe to call at any time.
    pub fn initialize(&mut self, call: &str, grid: &str) {
        self.identity = StationIdentity::new(call, grid);
        self.ctx = QsoContext::default();
        debug!(call = self.identity.call(), grid = self.identity.grid(), "sequencer initialized");
    }

    /// Own callsign and locator.
    pub fn identity(&self) -> &StationIdentity {
        &self.identity
    }

    /// The contact in progress.
    pub fn context(&self) -> &QsoContext {
        &self.ctx
    }

    /// Current contact state.
    pub fn state(&self) -> QsoState {
        self.ctx.state
    }

    /// Options in effect.
    pub fn options(&self) -> &SequencerOptions {
        &self.options
    }

    /// Turns unattended answering on or off.
    pub fn set_beacon(&mut self, beacon: bool) {
        self.options.beacon = beacon;
    }

    /// Band recorded with later contacts.
    pub fn set_band(&mut self, band: Band) {
        self.options.band = band;
    }

    /// CQ variant used from the next call on.
    pub fn set_cq(&mut self, cq: CqMessage) {
        self.options.cq = cq;
    }

    /// Contacts logged so far.
    pub fn worked_log(&self) -> &WorkedLog {
        &self.worked
    }

    /// Continues contact numbering after `last_seq`, e.g. from a reopened journal.
    pub fn resume_contact_seq(&mut self, last_seq: ContactSeq) {
        self.next_contact_seq = self.next_contact_seq.max(last_seq.saturating_add(1));
    }

    /// Takes the contacts completed since the last call, oldest first.
    pub fn drain_contacts(&mut self) -> Vec<StoredContact> {
        std::mem::take(&mut self.pending_contacts)
    }

    /// Starts a general call. CQs are never retried; repetition is up to the caller.
    pub fn start_general_call(&mut self) {
        self.ctx.peer_call = bounded(CQ_PEER);
        self.ctx.peer_grid.clear();
        self.ctx.sent_report = 0;
        self.ctx.received_report = 0;
        self.ctx.logged = false;
        self.set_state(QsoState::Calling, Some(MessageKind::Cq), 0);
        info!(call = self.identity.call(), "calling CQ");
    }

    /// Operator picked `record`. Always overrides whatever is in progress.
    ///
    /// Returns whether a transmission is armed.
    pub fn on_select(&mut self, record: &DecodedRecord) -> bool {
        let kind = classify(&record.field);

        if !self.identity.is(&record.addressee) {
            // Someone else's traffic: answer it as if it were their CQ.
            self.ctx.last_received = Some(MessageKind::Cq);
            self.begin_contact(&record.sender);
            if is_grid_locator(record.field.trim()) {
                self.ctx.peer_grid = bounded_upper(&record.field);
            }
            self.ctx.report_to_send = record.snr;
            self.ctx.logged = false;
            let (state, first) = if self.options.skip_grid {
                (QsoState::Report, MessageKind::Report)
            } else {
                (QsoState::Replying, MessageKind::Grid)
            };
            self.set_state(state, Some(first), self.options.retry_cap);
            debug!(peer = %self.ctx.peer_call, state = ?state, "answering selected station");
            return true;
        }

        self.ctx.last_received = Some(kind);
        self.capture_peer(record, kind);
        self.generate_response(kind, true)
    }

    /// Automatic path for every fresh decode. Returns whether a transmission is needed.
    pub fn on_decode(&mut self, record: &DecodedRecord) -> bool {
        if !self.identity.is(&record.addressee) {
            return false;
        }
        if self.ctx.state.locks_peer() && !self.ctx.peer_call.eq_ignore_ascii_case(record.sender.trim()) {
            debug!(sender = %record.sender, peer = %self.ctx.peer_call, "ignoring caller outside current contact");
            return false;
        }

        let kind = classify(&record.field);
        self.ctx.last_received = Some(kind);

        let fired = self.generate_response(kind, false);
        if fired {
            self.capture_peer(record, kind);
        }
        fired
    }

    /// Slot timeout after one of our transmissions went unanswered.
    ///
    /// Only updates what is armed; never transmits by itself.
    pub fn tick(&mut self) {
        let Some(policy) = timeout_policy(self.ctx.state) else {
            return;
        };

        match policy.resend {
            Some(kind) if self.ctx.retry_count < self.ctx.retry_limit => {
                self.ctx.next_tx = Some(kind);
                self.ctx.retry_count += 1;
                debug!(
                    state = ?self.ctx.state,
                    retry = self.ctx.retry_count,
                    limit = self.ctx.retry_limit,
                    "no reply, repeating {kind}"
                );
            }
            _ => {
                debug!(from = ?self.ctx.state, to = ?policy.fallback, "retries exhausted");
                self.set_state(policy.fallback, policy.fallback_tx, 0);
            }
        }
    }

    /// Renders the armed message, or `None` when nothing is armed.
    ///
    /// Rendering RR73 or 73 logs the contact, once.
    pub fn next_transmission_text(&mut self) -> Option<MessageText> {
        let kind = self.ctx.next_tx?;

        if self.ctx.retry_limit > 0 && self.ctx.retry_count >= self.ctx.retry_limit {
            self.ctx.state = QsoState::SignOff;
        }

        let text = format_message(
            kind,
            &FormatContext {
                identity: &self.identity,
                peer: &self.ctx.peer_call,
                report: self.ctx.report_to_send,
                cq: &self.options.cq,
            },
        );

        match kind {
            MessageKind::Report | MessageKind::AckReport => {
                self.ctx.sent_report = self.ctx.report_to_send;
            }
            MessageKind::RogerReport | MessageKind::Final => self.log_contact(),
            MessageKind::Grid | MessageKind::Cq => {}
        }

        Some(text)
    }

    /// `" RPRT tried:1"` style status, empty while idle.
    pub fn state_label(&self) -> LineText {
        if self.ctx.state == QsoState::Idle {
            return LineText::new();
        }
        format_bounded(format_args!(
            " {} tried:{}",
            self.ctx.state.tag(),
            self.ctx.retry_count
        ))
    }

    fn generate_response(&mut self, kind: MessageKind, manual: bool) -> bool {
        if manual {
            self.set_state(override_state(kind), None, 0);
        }

        if self.ctx.state == QsoState::Idle {
            if !self.options.beacon {
                return false;
            }
            self.ctx.state = QsoState::Calling;
        }

        let Some(action) = dispatch(self.ctx.state, kind) else {
            return false;
        };

        match action {
            Action::Advance { to, send, retry } => {
                let limit = match retry {
                    Retry::Capped => self.options.retry_cap,
                    Retry::Once => 0,
                };
                debug!(from = ?self.ctx.state, to = ?to, received = %kind, "sending {send}");
                self.set_state(to, Some(send), limit);
                true
            }
            Action::Complete => {
                self.log_contact();
                self.set_state(QsoState::Idle, None, 0);
                false
            }
            Action::Hold => false,
            Action::Finish => {
                self.set_state(QsoState::Idle, None, 0);
                false
            }
        }
    }

    fn set_state(&mut self, state: QsoState, next_tx: Option<MessageKind>, limit: u8) {
        self.ctx.state = state;
        self.ctx.next_tx = next_tx;
        self.ctx.retry_count = 0;
        self.ctx.retry_limit = limit;
        if state == QsoState::Idle {
            self.ctx.logged = false;
        }
    }

    /// Switches to `call` as peer; a different peer starts a fresh contact.
    fn begin_contact(&mut self, call: &str) {
        if !self.ctx.peer_call.eq_ignore_ascii_case(call.trim()) {
            self.ctx.peer_call = bounded_upper(call);
            self.ctx.peer_grid.clear();
            self.ctx.sent_report = 0;
            self.ctx.received_report = 0;
            self.ctx.logged = false;
        }
    }

    fn capture_peer(&mut self, record: &DecodedRecord, kind: MessageKind) {
        self.begin_contact(&record.sender);
        self.ctx.report_to_send = record.snr;
        match kind {
            MessageKind::Grid => self.ctx.peer_grid = bounded_upper(&record.field),
            MessageKind::Report | MessageKind::AckReport => {
                if let Some(received) = record.received_snr {
                    self.ctx.received_report = received;
                }
            }
            _ => {}
        }
    }

    fn log_contact(&mut self) {
        if self.ctx.logged || self.ctx.peer_call.is_empty() || self.ctx.peer_call.as_str() == CQ_PEER {
            return;
        }
        self.ctx.logged = true;

        let band = self.options.band;
        self.worked.append(LogEntry::new(
            band,
            &self.ctx.peer_call,
            self.ctx.sent_report,
            self.ctx.received_report,
        ));

        let seq = self.next_contact_seq;
        self.next_contact_seq += 1;
        let contact = ContactRecord {
            own_call: self.identity.call().to_string(),
            own_grid: self.identity.grid().to_string(),
            peer_call: self.ctx.peer_call.to_string(),
            peer_grid: self.ctx.peer_grid.to_string(),
            band,
            sent_report: self.ctx.sent_report,
            received_report: self.ctx.received_report,
            ts_ms: now_ms(),
        };
        info!(
            seq,
            peer = %contact.peer_call,
            band = band.label(),
            sent = contact.sent_report,
            received = contact.received_report,
            "contact logged"
        );
        self.pending_contacts.push(StoredContact { seq, contact });
    }
}

impl TimeoutHandler for AutoSequencer {
    fn on_slot_timeout(&mut self) {
        self.tick();
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
