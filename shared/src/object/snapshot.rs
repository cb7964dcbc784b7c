use crate::{
    messages::object_message::ObjectMessage,
    patch::patch_op::PatchOp,
    types::{ObjectId, Revision, Value},
};

/// Full value of an object at a given revision
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub id: ObjectId,
    pub rev: Revision,
    pub value: Value,
}

impl Snapshot {
    pub fn to_message(&self) -> ObjectMessage {
        ObjectMessage::Replace {
            id: self.id.clone(),
            rev: self.rev,
            value: self.value.clone(),
        }
    }
}

/// One revision step: the operations that moved an object from `rev - 1`
/// to `rev`
#[derive(Clone, Debug, PartialEq)]
pub struct PatchEntry {
    pub rev: Revision,
    pub ops: Vec<PatchOp>,
}

impl PatchEntry {
    pub fn to_message(&self, id: &ObjectId) -> ObjectMessage {
        ObjectMessage::Patch {
            id: id.clone(),
            rev: self.rev,
            ops: self.ops.clone(),
        }
    }
}
