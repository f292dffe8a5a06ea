//! Decoded message records handed over by the demodulator each cycle.

use serde::{Deserialize, Serialize};

use crate::types::Report;

/// One decoded standard message: `<addressee> <sender> <field>`.
///
/// Produced once per decode cycle by the decoder and never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedRecord {
    /// First callsign of the message, or `CQ ...` for a general call.
    pub addressee: String,
    /// Station that transmitted the message.
    pub sender: String,
    /// Report or locator field (`FN31`, `-08`, `R-12`, `RR73`, `73`).
    pub field: String,
    /// Our SNR estimate of the sender, in dB.
    pub snr: Report,
    /// Report the sender gave us, when the field carries one.
    #[serde(default)]
    pub received_snr: Option<Report>,
    /// Parity (0 or 1) of the slot the message was received in.
    pub slot: u8,
    /// True when the message is a general call (`CQ ...`).
    #[serde(default)]
    pub general_call: bool,
    /// Audio offset of the signal in Hz.
    #[serde(default)]
    pub freq_hz: u32,
}

impl DecodedRecord {
    /// Builds a record, deriving `received_snr` and `general_call` from the text fields.
    pub fn new(
        addressee: impl Into<String>,
        sender: impl Into<String>,
        field: impl Into<String>,
        snr: Report,
        slot: u8,
    ) -> Self {
        let addressee = addressee.into();
        let field = field.into();
        let general_call = addressee.trim_start().starts_with("CQ");
        Self {
            received_snr: parse_received_report(&field),
            addressee,
            sender: sender.into(),
            field,
            snr,
            slot: slot & 1,
            general_call,
            freq_hz: 0,
        }
    }

    /// Sets the audio offset.
    pub fn with_freq(mut self, freq_hz: u32) -> Self {
        self.freq_hz = freq_hz;
        self
    }

    /// Parity of the slot in which a reply to this record must be sent.
    pub fn reply_slot(&self) -> u8 {
        (self.slot & 1) ^ 1
    }

    /// Display text, `<addressee> <sender> <field>`.
    pub fn text(&self) -> String {
        format!("{} {} {}", self.addressee, self.sender, self.field)
    }
}

/// Extracts the numeric report from `-08` / `R+05` style fields.
///
/// Values of 30 and above are rejected so that `73` is never read as a report.
pub fn parse_received_report(field: &str) -> Option<Report> {
    let field = field.trim();
    let digits = field.strip_prefix('R').unwrap_or(field);
    let value: Report = digits.parse().ok()?;
    (value < 30).then_some(value)
}
