use thiserror::Error;

use crate::types::PeerId;

/// Errors that can occur when handing a message to the transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer's channel exists but is not open yet (or anymore)
    #[error("Channel to peer {peer} is not open")]
    ChannelNotOpen { peer: PeerId },

    /// The transport has no channel for this peer at all
    #[error("Unknown peer {peer}")]
    UnknownPeer { peer: PeerId },

    /// The underlying link rejected the payload
    #[error("Failed to send to peer {peer}: {reason}")]
    SendFailed { peer: PeerId, reason: String },
}
