use serde::{Deserialize, Serialize};

use crate::{
    text::{MessageText, bounded, format_bounded},
    types::{Report, StationIdentity},
};

use super::MessageKind;

/// What goes out in place of a plain `CQ` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CqMessage {
    /// `CQ <SELF> <GRID>`.
    #[default]
    Plain,
    /// `CQ SOTA <SELF> <GRID>`.
    Sota,
    /// `CQ POTA <SELF> <GRID>`.
    Pota,
    /// `CQ QRP <SELF> <GRID>`.
    Qrp,
    /// Operator text sent verbatim instead of a CQ.
    FreeText(String),
}

impl CqMessage {
    fn prefix(&self) -> Option<&'static str> {
        match self {
            CqMessage::Plain => Some("CQ"),
            CqMessage::Sota => Some("CQ SOTA"),
            CqMessage::Pota => Some("CQ POTA"),
            CqMessage::Qrp => Some("CQ QRP"),
            CqMessage::FreeText(_) => None,
        }
    }
}

/// Everything a message template can refer to.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    /// Own call and grid.
    pub identity: &'a StationIdentity,
    /// Peer callsign.
    pub peer: &'a str,
    /// Report we send to the peer.
    pub report: Report,
    /// CQ flavour.
    pub cq: &'a CqMessage,
}

/// Renders `kind` as transmit-ready text, truncated to
/// [`MAX_MSG_LEN`](crate::text::MAX_MSG_LEN).
pub fn format_message(kind: MessageKind, ctx: &FormatContext<'_>) -> MessageText {
    let me = ctx.identity.call();
    let peer = ctx.peer;
    match kind {
        MessageKind::Grid => {
            format_bounded(format_args!("{peer} {me} {}", ctx.identity.grid_square()))
        }
        MessageKind::Report => format_bounded(format_args!("{peer} {me} {:+}", ctx.report)),
        MessageKind::AckReport => format_bounded(format_args!("{peer} {me} R{:+}", ctx.report)),
        MessageKind::RogerReport => format_bounded(format_args!("{peer} {me} RR73")),
        MessageKind::Final => format_bounded(format_args!("{peer} {me} 73")),
        MessageKind::Cq => match ctx.cq {
            CqMessage::FreeText(text) => bounded(text.trim()),
            other => format_bounded(format_args!(
                "{} {me} {}",
                other.prefix().unwrap_or("CQ"),
                ctx.identity.grid_square()
            )),
        },
    }
}
