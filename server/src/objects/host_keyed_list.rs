use std::any::Any;

use serde_json::json;

use replica_shared::{HostFactoryContext, HostObject, HostSeed, PatchOp, Replica, Value};

use crate::HostError;

/// A host object holding a sequence of records, each identified by the
/// value of its `key` field (e.g. a roster keyed by `"participant"`).
pub struct HostKeyedList {
    replica: Replica,
    field: String,
    key: String,
}

impl HostKeyedList {
    pub fn new(replica: Replica, field: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            replica,
            field: field.into(),
            key: key.into(),
        }
    }

    /// Host factory helper: publishes `{ field: entries }`
    pub fn seed(
        context: &HostFactoryContext<'_>,
        field: impl Into<String>,
        key: impl Into<String>,
        entries: Vec<Value>,
    ) -> HostSeed {
        let field = field.into();
        let mut initial = serde_json::Map::new();
        initial.insert(field.clone(), Value::Array(entries));
        HostSeed {
            object: Box::new(Self::new(context.replica(), field, key)),
            initial: Value::Object(initial),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entries(&self) -> &[Value] {
        self.replica
            .value()
            .get(&self.field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries()
            .iter()
            .find(|entry| entry.get(&self.key) == Some(key))
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<&Value> {
        self.entries()
            .iter()
            .filter_map(|entry| entry.get(&self.key))
            .collect()
    }

    /// Inserts `record`, replacing any entry with the same key. A replaced
    /// entry moves to the end of the sequence.
    pub fn upsert_ops(&self, record: Value) -> Result<Vec<PatchOp>, HostError> {
        if !record.is_object() {
            return Err(HostError::NotARecord {
                id: self.id().clone(),
            });
        }
        let key = record
            .get(&self.key)
            .cloned()
            .ok_or_else(|| HostError::MissingKey {
                id: self.id().clone(),
                key: self.key.clone(),
            })?;

        let mut ops = Vec::with_capacity(2);
        if self.contains(&key) {
            ops.push(PatchOp::remove_by(self.field.as_str(), self.key.as_str(), key));
        }
        ops.push(PatchOp::insert(self.field.as_str(), json!([record])));
        Ok(ops)
    }

    /// Shallow-merges `partial` into the existing entry under `key`
    pub fn merge_entry_ops(&self, key: &Value, partial: Value) -> Result<Vec<PatchOp>, HostError> {
        let Value::Object(fields) = partial else {
            return Err(HostError::NotARecord {
                id: self.id().clone(),
            });
        };
        let mut entry = self
            .get(key)
            .cloned()
            .ok_or_else(|| HostError::UnknownEntry {
                id: self.id().clone(),
                entry: key.to_string(),
            })?;
        if let Value::Object(record) = &mut entry {
            for (name, value) in fields {
                if name != self.key {
                    record.insert(name, value);
                }
            }
        }
        self.upsert_ops(entry)
    }

    pub fn remove_ops(&self, key: Value) -> Vec<PatchOp> {
        vec![PatchOp::remove_by(
            self.field.as_str(),
            self.key.as_str(),
            key,
        )]
    }
}

impl HostObject for HostKeyedList {
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
