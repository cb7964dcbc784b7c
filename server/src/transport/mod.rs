mod outbox;

pub use outbox::{MessageTarget, Outbox, OutboxConfig};

use replica_shared::{LobbyMessage, PeerId, TransportError};

/// The host's view of the links to its peers.
///
/// Implementations only move envelopes; they never inspect or produce
/// replication messages themselves.
pub trait PeerTransport: Send {
    /// Whether a message to `peer` can be handed over right now
    fn is_open(&self, peer: &PeerId) -> bool;

    fn send(&mut self, peer: &PeerId, message: &LobbyMessage) -> Result<(), TransportError>;
}
