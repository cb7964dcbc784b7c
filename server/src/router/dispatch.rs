use std::fmt;

/// What became of one inbound message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Dropped(DropReason),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled)
    }
}

/// Why a message was dropped. The sender never hears about any of these,
/// apart from an explicit rejection message a command may define.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Body or envelope failed structural parsing
    Malformed,
    /// The command's authorization check refused the sender
    Unauthorized,
    /// The sender exceeded a sliding-window quota
    RateLimited,
    /// Nothing claims this message kind
    UnknownKind,
    /// Sender is not a connected peer
    UnknownPeer,
    /// Peers may not publish object state
    NotPermitted,
    /// The command handler returned an error
    HandlerFailed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DropReason::Malformed => "malformed",
            DropReason::Unauthorized => "unauthorized",
            DropReason::RateLimited => "rate limited",
            DropReason::UnknownKind => "unknown kind",
            DropReason::UnknownPeer => "unknown peer",
            DropReason::NotPermitted => "not permitted",
            DropReason::HandlerFailed => "handler failed",
        };
        f.write_str(name)
    }
}
