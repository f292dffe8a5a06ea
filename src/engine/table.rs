//! The auto-sequencer's behaviour as data: one table keyed by
//! (state, received message) and one keyed by state for slot timeouts.

use crate::message::{MessageKind, MessageKind as M};

use super::state::{QsoState, QsoState as S};

/// Retry budget granted when entering a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    /// Configured retry cap.
    Capped,
    /// Sent once, never retried.
    Once,
}

/// What a received message does to the current contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move to `to` and arm `send`.
    Advance {
        /// Next state.
        to: QsoState,
        /// Message armed on entry.
        send: MessageKind,
        /// Retry budget of the new state.
        retry: Retry,
    },
    /// Contact confirmed: log it (if not yet logged) and go idle.
    Complete,
    /// Leave everything as is; the peer is repeating itself.
    Hold,
    /// Go idle without transmitting.
    Finish,
}

/// One row of [`DISPATCH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// State the row applies to.
    pub state: QsoState,
    /// Classification of the incoming message.
    pub received: MessageKind,
    /// What happens when the row matches.
    pub action: Action,
}

const fn advance(
    state: QsoState,
    received: MessageKind,
    to: QsoState,
    send: MessageKind,
    retry: Retry,
) -> Rule {
    Rule {
        state,
        received,
        action: Action::Advance { to, send, retry },
    }
}

const fn rule(state: QsoState, received: MessageKind, action: Action) -> Rule {
    Rule {
        state,
        received,
        action,
    }
}

/// Response table. Combinations not listed are ignored.
pub const DISPATCH: &[Rule] = &[
    advance(S::Calling, M::Grid, S::Report, M::Report, Retry::Capped),
    advance(S::Calling, M::Report, S::RogerReport, M::AckReport, Retry::Capped),
    advance(S::Calling, M::AckReport, S::Rogers, M::RogerReport, Retry::Capped),
    advance(S::Replying, M::Report, S::RogerReport, M::AckReport, Retry::Capped),
    advance(S::Replying, M::AckReport, S::Rogers, M::RogerReport, Retry::Capped),
    advance(S::Replying, M::RogerReport, S::SignOff, M::Final, Retry::Once),
    advance(S::Replying, M::Final, S::SignOff, M::Final, Retry::Once),
    advance(S::Report, M::AckReport, S::Rogers, M::RogerReport, Retry::Capped),
    advance(S::Report, M::RogerReport, S::SignOff, M::Final, Retry::Once),
    advance(S::Report, M::Final, S::SignOff, M::Final, Retry::Once),
    advance(S::RogerReport, M::RogerReport, S::SignOff, M::Final, Retry::Once),
    advance(S::RogerReport, M::Final, S::SignOff, M::Final, Retry::Once),
    rule(S::Rogers, M::RogerReport, Action::Complete),
    rule(S::Rogers, M::Final, Action::Complete),
    rule(S::SignOff, M::RogerReport, Action::Hold),
    rule(S::SignOff, M::Grid, Action::Finish),
    rule(S::SignOff, M::Report, Action::Finish),
    rule(S::SignOff, M::AckReport, Action::Finish),
    rule(S::SignOff, M::Final, Action::Finish),
    rule(S::SignOff, M::Cq, Action::Finish),
];

/// Looks up the action for `received` while in `state`.
pub fn dispatch(state: QsoState, received: MessageKind) -> Option<Action> {
    DISPATCH
        .iter()
        .find(|r| r.state == state && r.received == received)
        .map(|r| r.action)
}

/// State the sequencer is forced into before dispatching a message the
/// operator picked by hand, so that dispatch advances exactly one step.
pub fn override_state(received: MessageKind) -> QsoState {
    match received {
        M::Grid => S::Calling,
        M::Report => S::Replying,
        M::AckReport => S::Report,
        // A bare 73 is answered with a courtesy 73, like RR73.
        M::RogerReport | M::Final => S::RogerReport,
        M::Cq => S::Idle,
    }
}

/// Slot-timeout behaviour of one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// State the row applies to.
    pub state: QsoState,
    /// Message repeated while the retry budget lasts; `None` means no budget.
    pub resend: Option<MessageKind>,
    /// State entered once the budget is spent.
    pub fallback: QsoState,
    /// Message armed on fallback.
    pub fallback_tx: Option<MessageKind>,
}

const fn timeout(
    state: QsoState,
    resend: Option<MessageKind>,
    fallback: QsoState,
    fallback_tx: Option<MessageKind>,
) -> TimeoutPolicy {
    TimeoutPolicy {
        state,
        resend,
        fallback,
        fallback_tx,
    }
}

/// Timeout table. `Idle` has no entry: a tick while idle does nothing.
pub const TIMEOUTS: &[TimeoutPolicy] = &[
    timeout(S::Replying, Some(M::Grid), S::SignOff, Some(M::Final)),
    timeout(S::Report, Some(M::Report), S::SignOff, Some(M::Final)),
    timeout(S::RogerReport, Some(M::AckReport), S::SignOff, Some(M::Final)),
    timeout(S::Rogers, Some(M::RogerReport), S::Idle, None),
    timeout(S::Calling, None, S::Idle, None),
    timeout(S::SignOff, None, S::Idle, None),
];

/// Looks up the timeout policy for `state`.
pub fn timeout_policy(state: QsoState) -> Option<TimeoutPolicy> {
    TIMEOUTS.iter().find(|p| p.state == state).copied()
}
