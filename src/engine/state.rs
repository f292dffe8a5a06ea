use std::fmt;

use serde::{Deserialize, Serialize};

/// Auto-sequencer protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QsoState {
    /// No contact in progress.
    #[default]
    Idle,
    /// A general call (CQ) went out.
    Calling,
    /// We answered someone's CQ with our grid.
    Replying,
    /// We sent a signal report.
    Report,
    /// We sent an acknowledged report.
    RogerReport,
    /// We acknowledged the peer's report (RR73) and wait for the final 73.
    Rogers,
    /// Final 73 sent; cleanup pending.
    SignOff,
}

impl QsoState {
    /// Four-character display tag, empty for [`QsoState::Idle`].
    pub fn tag(self) -> &'static str {
        match self {
            QsoState::Idle => "",
            QsoState::Calling => "CALL",
            QsoState::Replying => "RPLY",
            QsoState::Report => "RPRT",
            QsoState::RogerReport => "RRPT",
            QsoState::Rogers => "RGRS",
            QsoState::SignOff => "SOFF",
        }
    }

    /// States in which a reply from anyone but the current peer is ignored.
    pub fn locks_peer(self) -> bool {
        matches!(
            self,
            QsoState::Replying | QsoState::Report | QsoState::RogerReport
        )
    }
}

impl fmt::Display for QsoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QsoState::Idle => f.write_str("IDLE"),
            other => f.write_str(other.tag()),
        }
    }
}
