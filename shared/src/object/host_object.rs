use std::any::Any;

use crate::{
    messages::object_message::ObjectMessage,
    object::{
        replica::{CatchUp, Replica},
        snapshot::{PatchEntry, Snapshot},
    },
    types::{ObjectId, Revision},
};

/// The authoritative, host-side shape of a replicated object.
///
/// Concrete kinds only have to expose their `Replica`; serving requests,
/// snapshots and log slices come from it.
pub trait HostObject: Any + Send {
    fn replica(&self) -> &Replica;

    fn replica_mut(&mut self) -> &mut Replica;

    fn as_any(&self) -> &dyn Any;

    fn id(&self) -> &ObjectId {
        self.replica().id()
    }

    /// The messages that bring a peer holding `since_rev` up to date
    fn on_request(&self, since_rev: Option<Revision>) -> Vec<ObjectMessage> {
        match self.replica().catch_up(since_rev) {
            CatchUp::Snapshot(snapshot) => vec![snapshot.to_message()],
            CatchUp::Patches(entries) => entries
                .iter()
                .map(|entry| entry.to_message(self.id()))
                .collect(),
            CatchUp::UpToDate | CatchUp::Uninitialized => Vec::new(),
        }
    }

    fn get_snapshot(&self) -> Option<Snapshot> {
        self.replica().snapshot()
    }

    fn get_logs_since(&self, since_rev: Revision) -> Option<Vec<PatchEntry>> {
        self.replica().logs_since(since_rev)
    }
}
