use replica_shared::{LobbyMessage, ObjectId, Revision};

/// What a PeerSession surfaces to the application
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// A mirror advanced to `rev`
    Updated { id: ObjectId, rev: Revision },
    /// A domain message (command result or broadcast) from the host
    Lobby(LobbyMessage),
    /// Nothing was heard from the host within the session timeout; the
    /// session has been left
    SessionTimedOut,
}
