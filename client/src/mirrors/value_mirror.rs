use std::any::Any;

use replica_shared::{apply_ops, ClientObject, PatchError, PatchOp, Revision, Value};

/// Default mirror: keeps the host's value as a plain tree
#[derive(Default)]
pub struct ValueMirror {
    revision: Revision,
    value: Value,
}

impl ValueMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }
}

impl ClientObject for ValueMirror {
    fn on_replace(&mut self, rev: Revision, value: Value) {
        self.revision = rev;
        self.value = value;
    }

    fn on_patch(&mut self, rev: Revision, ops: &[PatchOp]) -> Result<(), PatchError> {
        self.value = apply_ops(&self.value, ops)?;
        self.revision = rev;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
