use std::collections::HashMap;

use replica_shared::{ObjectId, PeerId, Revision};

/// Last revision each peer confirmed applying, per object
#[derive(Default)]
pub struct AckTracker {
    acks: HashMap<PeerId, HashMap<ObjectId, Revision>>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acked(&self, peer: &PeerId, id: &ObjectId) -> Option<Revision> {
        self.acks.get(peer)?.get(id).copied()
    }

    /// Records an ack. Acks only move forward; returns whether this one did.
    pub fn record(&mut self, peer: &PeerId, id: &ObjectId, rev: Revision) -> bool {
        let objects = self.acks.entry(peer.clone()).or_default();
        match objects.get(id) {
            Some(current) if *current >= rev => false,
            _ => {
                objects.insert(id.clone(), rev);
                true
            }
        }
    }

    pub fn remove_peer(&mut self, peer: &PeerId) {
        self.acks.remove(peer);
    }

    pub fn peer_count(&self) -> usize {
        self.acks.len()
    }
}
