use std::any::Any;

use replica_shared::{HostFactoryContext, HostObject, HostSeed, PatchOp, Replica, Value};

/// A host object whose value is one record, replaced or merged as a whole
pub struct HostValue {
    replica: Replica,
}

impl HostValue {
    pub fn new(replica: Replica) -> Self {
        Self { replica }
    }

    /// Host factory helper: a fresh object published with `initial`
    pub fn seed(context: &HostFactoryContext<'_>, initial: Value) -> HostSeed {
        HostSeed {
            object: Box::new(Self::new(context.replica())),
            initial,
        }
    }

    pub fn value(&self) -> &Value {
        self.replica.value()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.replica.value().get(name)
    }

    pub fn replace_ops(value: Value) -> Vec<PatchOp> {
        vec![PatchOp::set(value)]
    }

    pub fn merge_ops(partial: Value) -> Vec<PatchOp> {
        vec![PatchOp::merge(partial)]
    }
}

impl HostObject for HostValue {
    fn replica(&self) -> &Replica {
        &self.replica
    }

    fn replica_mut(&mut self) -> &mut Replica {
        &mut self.replica
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
