use std::any::Any;

use serde_json::json;

use replica_shared::{
    HostFactoryContext, HostObject, HostSeed, PatchOp, Replica, Value, DEFAULT_IDENTITY_KEY,
};

/// A host object holding one sequence field, e.g. a chat log
pub struct HostList {
    replica: Replica,
    field: String,
}

impl HostList {
    pub fn new(replica: Replica, field: impl Into<String>) -> Self {
        Self {
            replica,
            field: field.into(),
        }
    }

    /// Host factory helper: publishes `{ field: items }`
    pub fn seed(
        context: &HostFactoryContext<'_>,
        field: impl Into<String>,
        items: Vec<Value>,
    ) -> HostSeed {
        let field = field.into();
        let mut initial = serde_json::Map::new();
        initial.insert(field.clone(), Value::Array(items));
        HostSeed {
            object: Box::new(Self::new(context.replica(), field)),
            initial: Value::Object(initial),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn items(&self) -> &[Value] {
        self.replica
            .value()
            .get(&self.field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Whether an item with this identity is present. Scalars compare
    /// directly, records by their `"id"` field.
    pub fn contains(&self, identity: &Value) -> bool {
        self.items().iter().any(|item| {
            item == identity || item.get(DEFAULT_IDENTITY_KEY) == Some(identity)
        })
    }

    /// Appends exactly one item, even when the item is itself a sequence
    pub fn push_ops(&self, item: Value) -> Vec<PatchOp> {
        vec![PatchOp::insert(self.field.as_str(), json!([item]))]
    }

    pub fn extend_ops(&self, items: Vec<Value>) -> Vec<PatchOp> {
        vec![PatchOp::insert(self.field.as_str(), Value::Array(items))]
    }

    pub fn remove_ops(&self, identity: Value) -> Vec<PatchOp> {
        vec![PatchOp::remove(self.field.as_str(), identity)]
    }
}

impl HostObject for HostList {
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
