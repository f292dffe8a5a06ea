//! Station configuration, loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    engine::SequencerOptions,
    log::worked::{DEFAULT_CAPACITY, DEFAULT_PAGE_ROWS},
    message::{CqMessage, is_grid_locator},
    scheduler::SlotConfig,
    text::CALLSIGN_LEN,
    types::Band,
};

/// Failure loading or validating a [`StationConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Io(std::io::Error),
    /// Config file is not valid JSON for this schema.
    Json(serde_json::Error),
    /// A field holds an unusable value.
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Worked-list sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Entries kept before the oldest is overwritten.
    pub capacity: usize,
    /// Entries per displayed page.
    pub page_rows: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            page_rows: DEFAULT_PAGE_ROWS,
        }
    }
}

/// Everything needed to bring up a [`Station`](crate::station::Station).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Own callsign.
    pub callsign: String,
    /// Own Maidenhead locator, 4 or 6 characters.
    pub grid: String,
    /// Operating band, recorded with each contact.
    #[serde(default)]
    pub band: Band,
    /// Repeats of an unanswered message.
    #[serde(default = "default_retry_cap")]
    pub retry_cap: u8,
    /// Answer callers and keep calling CQ unattended.
    #[serde(default)]
    pub beacon: bool,
    /// Answer a CQ with a report straight away.
    #[serde(default)]
    pub skip_grid: bool,
    /// CQ variant sent when calling.
    #[serde(default)]
    pub cq: CqMessage,
    /// Slot timing.
    #[serde(default)]
    pub slot: SlotConfig,
    /// Worked list sizing.
    #[serde(default)]
    pub log: LogConfig,
}

fn default_retry_cap() -> u8 {
    crate::engine::sequencer::DEFAULT_RETRY_CAP
}

impl StationConfig {
    /// Config with defaults for everything but the identity.
    pub fn new(callsign: impl Into<String>, grid: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            grid: grid.into(),
            band: Band::default(),
            retry_cap: default_retry_cap(),
            beacon: false,
            skip_grid: false,
            cq: CqMessage::default(),
            slot: SlotConfig::default(),
            log: LogConfig::default(),
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks callsign, locator, slot timing and log sizes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let call = self.callsign.trim();
        if call.is_empty() {
            return Err(ConfigError::Invalid("callsign is empty".to_string()));
        }
        if call.len() > CALLSIGN_LEN {
            return Err(ConfigError::Invalid(format!(
                "callsign {call} longer than {CALLSIGN_LEN} characters"
            )));
        }
        if !call.chars().all(|c| c.is_ascii_alphanumeric() || c == '/') {
            return Err(ConfigError::Invalid(format!("callsign {call} has invalid characters")));
        }
        if !is_grid_locator(self.grid.trim()) {
            return Err(ConfigError::Invalid(format!("grid {} is not a locator", self.grid)));
        }
        if self.slot.period_ms == 0 || self.slot.symbol_ms == 0 {
            return Err(ConfigError::Invalid("slot timing must be non-zero".to_string()));
        }
        if self.slot.symbol_ms.saturating_mul(self.slot.tx_window_symbols) > self.slot.period_ms {
            return Err(ConfigError::Invalid(
                "transmit window exceeds the slot period".to_string(),
            ));
        }
        if self.log.capacity == 0 || self.log.page_rows == 0 {
            return Err(ConfigError::Invalid("log capacity and page rows must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Options for the [`AutoSequencer`](crate::engine::AutoSequencer).
    pub fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            retry_cap: self.retry_cap,
            beacon: self.beacon,
            skip_grid: self.skip_grid,
            band: self.band,
            cq: self.cq.clone(),
            log_capacity: self.log.capacity,
        }
    }
}
