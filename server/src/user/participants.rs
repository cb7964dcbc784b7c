use std::{collections::HashMap, fmt};

use log::debug;
use serde::{Deserialize, Serialize};

use replica_shared::{PeerId, Value};

/// Application-level identity of whoever sits behind a peer connection
/// (an actor id, a player name...)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value stored in roster records
    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Two-way peer/participant mapping. Each peer acts as at most one
/// participant and each participant is bound to at most one peer.
#[derive(Default)]
pub struct Participants {
    by_peer: HashMap<PeerId, ParticipantId>,
    by_participant: HashMap<ParticipantId, PeerId>,
}

impl Participants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `peer` to `participant`, replacing earlier bindings of either
    pub fn bind(&mut self, peer: PeerId, participant: ParticipantId) {
        if let Some(previous) = self.by_peer.remove(&peer) {
            self.by_participant.remove(&previous);
        }
        if let Some(previous) = self.by_participant.remove(&participant) {
            debug!("participant {} moved from {} to {}", participant, previous, peer);
            self.by_peer.remove(&previous);
        }
        self.by_peer.insert(peer.clone(), participant.clone());
        self.by_participant.insert(participant, peer);
    }

    pub fn unbind_peer(&mut self, peer: &PeerId) -> Option<ParticipantId> {
        let participant = self.by_peer.remove(peer)?;
        self.by_participant.remove(&participant);
        Some(participant)
    }

    pub fn participant_of(&self, peer: &PeerId) -> Option<&ParticipantId> {
        self.by_peer.get(peer)
    }

    pub fn peer_of(&self, participant: &ParticipantId) -> Option<&PeerId> {
        self.by_participant.get(participant)
    }

    pub fn len(&self) -> usize {
        self.by_peer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_peer.is_empty()
    }
}
