use serde::{Deserialize, Serialize};

use crate::types::Value;

/// Identity field used by `remove` when the op does not name one.
pub const DEFAULT_IDENTITY_KEY: &str = "id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatchOpKind {
    Set,
    Merge,
    Insert,
    Remove,
}

impl PatchOpKind {
    pub fn name(&self) -> &'static str {
        match self {
            PatchOpKind::Set => "set",
            PatchOpKind::Merge => "merge",
            PatchOpKind::Insert => "insert",
            PatchOpKind::Remove => "remove",
        }
    }
}

/// One step of a mutation. A mutation bundles one or more of these, applied
/// in order and recorded as a single revision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Replace the field at `path`, or the whole value when `path` is absent
    Set {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        value: Value,
    },
    /// Shallow-merge a record into the record at `path` (root when absent)
    Merge {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        value: Value,
    },
    /// Append one item, or every item of a sequence payload, to the sequence
    /// field at `path`
    Insert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        value: Value,
    },
    /// Delete the items whose identity matches `value` from the sequence field
    /// at `path`
    Remove {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
}

impl PatchOp {
    pub fn set(value: Value) -> Self {
        Self::Set { path: None, value }
    }

    pub fn set_at(path: impl Into<String>, value: Value) -> Self {
        Self::Set {
            path: Some(path.into()),
            value,
        }
    }

    pub fn merge(value: Value) -> Self {
        Self::Merge { path: None, value }
    }

    pub fn merge_at(path: impl Into<String>, value: Value) -> Self {
        Self::Merge {
            path: Some(path.into()),
            value,
        }
    }

    pub fn insert(path: impl Into<String>, value: Value) -> Self {
        Self::Insert {
            path: Some(path.into()),
            value,
        }
    }

    pub fn remove(path: impl Into<String>, identity: Value) -> Self {
        Self::Remove {
            path: Some(path.into()),
            value: identity,
            key: None,
        }
    }

    /// Remove by a record field other than `"id"`
    pub fn remove_by(path: impl Into<String>, key: impl Into<String>, identity: Value) -> Self {
        Self::Remove {
            path: Some(path.into()),
            value: identity,
            key: Some(key.into()),
        }
    }

    pub fn kind(&self) -> PatchOpKind {
        match self {
            PatchOp::Set { .. } => PatchOpKind::Set,
            PatchOp::Merge { .. } => PatchOpKind::Merge,
            PatchOp::Insert { .. } => PatchOpKind::Insert,
            PatchOp::Remove { .. } => PatchOpKind::Remove,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            PatchOp::Set { path, .. }
            | PatchOp::Merge { path, .. }
            | PatchOp::Insert { path, .. }
            | PatchOp::Remove { path, .. } => path.as_deref(),
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            PatchOp::Set { value, .. }
            | PatchOp::Merge { value, .. }
            | PatchOp::Insert { value, .. }
            | PatchOp::Remove { value, .. } => value,
        }
    }
}
