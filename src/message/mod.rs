//! Canonical FT8 messages: classification of received fields and rendering of
//! outgoing text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Received-field classification.
pub mod classify;
/// Outgoing text templates.
pub mod format;

pub use classify::{classify, is_grid_locator};
pub use format::{CqMessage, FormatContext, format_message};

/// The six canonical messages of a standard FT8 exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// TX1: `<PEER> <SELF> <GRID>`.
    Grid,
    /// TX2: `<PEER> <SELF> <±REPORT>`.
    Report,
    /// TX3: `<PEER> <SELF> R<±REPORT>`.
    AckReport,
    /// TX4: `<PEER> <SELF> RR73`.
    RogerReport,
    /// TX5: `<PEER> <SELF> 73`.
    Final,
    /// TX6: `CQ <SELF> <GRID>`.
    Cq,
}

impl MessageKind {
    /// Conventional TX number (1..=6).
    pub fn tx_number(self) -> u8 {
        match self {
            MessageKind::Grid => 1,
            MessageKind::Report => 2,
            MessageKind::AckReport => 3,
            MessageKind::RogerReport => 4,
            MessageKind::Final => 5,
            MessageKind::Cq => 6,
        }
    }

    /// True for the messages whose transmission completes a contact.
    pub fn completes_contact(self) -> bool {
        matches!(self, MessageKind::RogerReport | MessageKind::Final)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TX{}", self.tx_number())
    }
}
