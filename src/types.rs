//! Shared primitive types and band definitions.

use serde::{Deserialize, Serialize};

use crate::text::{Callsign, Locator, bounded_upper};

/// Signal report in dB, as exchanged on air.
pub type Report = i32;
/// Monotonic sequence number of a persisted contact.
pub type ContactSeq = u64;

/// HF band with a standard FT8 dial frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Band {
    /// 40 meters.
    #[serde(rename = "40m")]
    B40m,
    /// 30 meters.
    #[serde(rename = "30m")]
    B30m,
    /// 20 meters.
    #[default]
    #[serde(rename = "20m")]
    B20m,
    /// 17 meters.
    #[serde(rename = "17m")]
    B17m,
    /// 15 meters.
    #[serde(rename = "15m")]
    B15m,
    /// 12 meters.
    #[serde(rename = "12m")]
    B12m,
    /// 10 meters.
    #[serde(rename = "10m")]
    B10m,
}

impl Band {
    /// All supported bands, lowest frequency first.
    pub const ALL: [Band; 7] = [
        Band::B40m,
        Band::B30m,
        Band::B20m,
        Band::B17m,
        Band::B15m,
        Band::B12m,
        Band::B10m,
    ];

    /// Short label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Band::B40m => "40",
            Band::B30m => "30",
            Band::B20m => "20",
            Band::B17m => "17",
            Band::B15m => "15",
            Band::B12m => "12",
            Band::B10m => "10",
        }
    }

    /// FT8 dial frequency in kHz.
    pub fn dial_khz(self) -> u32 {
        match self {
            Band::B40m => 7_074,
            Band::B30m => 10_136,
            Band::B20m => 14_074,
            Band::B17m => 18_100,
            Band::B15m => 21_074,
            Band::B12m => 24_915,
            Band::B10m => 28_074,
        }
    }
}

/// Own callsign and grid, fixed after initialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StationIdentity {
    call: Callsign,
    grid: Locator,
}

impl StationIdentity {
    /// Builds an identity, upper-casing the callsign and truncating both fields.
    pub fn new(call: &str, grid: &str) -> Self {
        let raw: Locator = crate::text::bounded(grid.trim());
        // Subsquare letters are conventionally lower case.
        let mut normalized = Locator::new();
        for (i, c) in raw.chars().enumerate() {
            let c = if i < 4 { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() };
            let _ = normalized.push(c);
        }
        Self {
            call: bounded_upper(call),
            grid: normalized,
        }
    }

    /// Own callsign.
    pub fn call(&self) -> &str {
        &self.call
    }

    /// Own full locator.
    pub fn grid(&self) -> &str {
        &self.grid
    }

    /// Four-character square, as carried in standard messages.
    pub fn grid_square(&self) -> &str {
        self.grid
            .char_indices()
            .nth(4)
            .map_or(&self.grid[..], |(end, _)| &self.grid[..end])
    }

    /// True when `call` names this station.
    pub fn is(&self, call: &str) -> bool {
        !self.call.is_empty() && self.call.eq_ignore_ascii_case(call.trim())
    }
}
