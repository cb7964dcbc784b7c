//! # `ReplicationEngine` – host side
//!
//! Owns the authoritative instance of every shared object and decides what
//! each connected peer receives when an object changes or a peer asks for
//! state.
//!
//! * `initialize` publishes revision 1 and pushes it as a snapshot.
//! * `apply_patch` commits one revision step and plans delivery per peer
//!   from that peer's ack state (see [`plan_delivery`]).
//! * `serve_request` answers `object:request` with either the exact missing
//!   log slice or a full snapshot.
//!
//! Callers never build wire messages: everything leaves through the
//! [`Outbox`] passed in as context.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};

use replica_shared::{
    HostObject, HostObjectLookup, ObjectId, PatchEntry, PatchOp, PeerId, Revision, Snapshot,
    Value,
};

use crate::{
    engine::{
        ack_tracker::AckTracker,
        delivery::{plan_delivery, Delivery},
    },
    transport::Outbox,
    HostError,
};

pub struct ReplicationEngine {
    objects: HashMap<ObjectId, Box<dyn HostObject>>,
    order: Vec<ObjectId>,
    peers: BTreeSet<PeerId>,
    acks: AckTracker,
}

impl Default for ReplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationEngine {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            order: Vec::new(),
            peers: BTreeSet::new(),
            acks: AckTracker::new(),
        }
    }

    // Objects

    /// Adopts a constructed, not yet published object
    pub fn insert(&mut self, object: Box<dyn HostObject>) -> Result<(), HostError> {
        let id = object.id().clone();
        if self.objects.contains_key(&id) {
            return Err(HostError::DuplicateObject { id });
        }
        self.order.push(id.clone());
        self.objects.insert(id, object);
        Ok(())
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Object ids in insertion order
    pub fn object_ids(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn object(&self, id: &ObjectId) -> Option<&dyn HostObject> {
        self.objects.get(id).map(|object| object.as_ref())
    }

    /// Typed read access to a concrete object kind
    pub fn object_as<T: HostObject>(&self, id: &ObjectId) -> Result<&T, HostError> {
        let object = self
            .objects
            .get(id)
            .ok_or_else(|| HostError::UnknownObject { id: id.clone() })?;
        object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| HostError::ObjectKindMismatch {
                id: id.clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn revision(&self, id: &ObjectId) -> Option<Revision> {
        self.objects.get(id).map(|object| object.replica().revision())
    }

    // Publishing

    /// First publish at revision 1. Already-initialized objects are left
    /// untouched and an error is returned.
    pub fn initialize(
        &mut self,
        id: &ObjectId,
        value: Value,
        outbox: &mut Outbox,
    ) -> Result<Revision, HostError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownObject { id: id.clone() })?;
        let rev = object.replica_mut().initialize(value)?;
        info!("initialized object {} at revision {}", id, rev);

        if let Some(snapshot) = object.get_snapshot() {
            let message = snapshot.to_message();
            for peer in &self.peers {
                outbox.send_object(peer, &message);
            }
        }
        Ok(rev)
    }

    /// Applies every op or none, records one revision step and delivers it
    pub fn apply_patch(
        &mut self,
        id: &ObjectId,
        ops: Vec<PatchOp>,
        outbox: &mut Outbox,
    ) -> Result<Revision, HostError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownObject { id: id.clone() })?;
        let entry = object.replica_mut().apply_patch(ops)?;
        debug!("object {} advanced to revision {}", id, entry.rev);

        self.deliver(id, &entry, outbox);
        Ok(entry.rev)
    }

    /// Builds ops from the typed object, then applies them like `apply_patch`
    pub fn mutate<T, F>(
        &mut self,
        id: &ObjectId,
        outbox: &mut Outbox,
        build: F,
    ) -> Result<Revision, HostError>
    where
        T: HostObject,
        F: FnOnce(&T) -> Result<Vec<PatchOp>, HostError>,
    {
        let ops = build(self.object_as::<T>(id)?)?;
        self.apply_patch(id, ops, outbox)
    }

    fn deliver(&self, id: &ObjectId, entry: &PatchEntry, outbox: &mut Outbox) {
        let Some(object) = self.objects.get(id) else {
            return;
        };
        let policy = object.replica().policy();
        let patch = entry.to_message(id);
        let mut snapshot = None;

        for peer in &self.peers {
            match plan_delivery(policy, self.acks.acked(peer, id), entry.rev) {
                Delivery::Patch => outbox.send_object(peer, &patch),
                Delivery::Snapshot => {
                    let message = snapshot
                        .get_or_insert_with(|| object.get_snapshot().map(|s| s.to_message()));
                    if let Some(message) = message {
                        outbox.send_object(peer, message);
                    }
                }
                Delivery::Skip => {
                    debug!(
                        "peer {} is too far behind on {}, waiting for its request",
                        peer, id
                    );
                }
            }
        }
    }

    // Serving

    /// Answers `object:request`. Returns how many messages were sent.
    pub fn serve_request(
        &self,
        peer: &PeerId,
        id: &ObjectId,
        since_rev: Option<Revision>,
        outbox: &mut Outbox,
    ) -> usize {
        let Some(object) = self.objects.get(id) else {
            warn!("peer {} requested unknown object {}", peer, id);
            return 0;
        };
        let messages = object.on_request(since_rev);
        debug!(
            "serving {} to {} since {:?}: {} message(s)",
            id,
            peer,
            since_rev,
            messages.len()
        );
        for message in &messages {
            outbox.send_object(peer, message);
        }
        messages.len()
    }

    /// Pushes the current snapshot of one object to one peer
    pub fn send_snapshot(&self, peer: &PeerId, id: &ObjectId, outbox: &mut Outbox) -> bool {
        match self.get_snapshot(id) {
            Some(snapshot) => {
                outbox.send_object(peer, &snapshot.to_message());
                true
            }
            None => false,
        }
    }

    pub fn get_snapshot(&self, id: &ObjectId) -> Option<Snapshot> {
        self.objects.get(id)?.get_snapshot()
    }

    pub fn get_logs_since(&self, id: &ObjectId, since_rev: Revision) -> Option<Vec<PatchEntry>> {
        self.objects.get(id)?.get_logs_since(since_rev)
    }

    // Peers

    pub fn connect_peer(&mut self, peer: &PeerId) -> bool {
        self.peers.insert(peer.clone())
    }

    /// Forgets the peer and its ack state
    pub fn disconnect_peer(&mut self, peer: &PeerId) -> bool {
        self.acks.remove_peer(peer);
        self.peers.remove(peer)
    }

    pub fn is_connected(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.iter()
    }

    pub fn acknowledge(&mut self, peer: &PeerId, id: &ObjectId, rev: Revision) -> bool {
        if !self.peers.contains(peer) {
            debug!("ignoring ack from disconnected peer {}", peer);
            return false;
        }
        let Some(current) = self.revision(id) else {
            debug!("ignoring ack from {} for unknown object {}", peer, id);
            return false;
        };
        if rev > current {
            warn!(
                "peer {} acked {} at revision {}, but host is at {}",
                peer, id, rev, current
            );
            return false;
        }
        self.acks.record(peer, id, rev)
    }

    pub fn acked(&self, peer: &PeerId, id: &ObjectId) -> Option<Revision> {
        self.acks.acked(peer, id)
    }
}

impl HostObjectLookup for ReplicationEngine {
    fn host_object(&self, id: &ObjectId) -> Option<&dyn HostObject> {
        self.object(id)
    }
}
