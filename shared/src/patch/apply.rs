use serde_json::Map;

use crate::{
    patch::{
        error::PatchError,
        patch_op::{PatchOp, DEFAULT_IDENTITY_KEY},
    },
    types::Value,
};

const ROOT: &str = "<root>";

/// Folds `ops` into a copy of `value`, in order.
///
/// All-or-nothing: if any operation fails, the error is returned and the
/// caller's value is left exactly as it was.
pub fn apply_ops(value: &Value, ops: &[PatchOp]) -> Result<Value, PatchError> {
    if ops.is_empty() {
        return Err(PatchError::EmptyPatch);
    }
    let mut next = value.clone();
    for op in ops {
        apply_op(&mut next, op)?;
    }
    Ok(next)
}

fn apply_op(target: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Set { path: None, value } => {
            *target = value.clone();
        }
        PatchOp::Set {
            path: Some(path),
            value,
        } => {
            if let Some(slot) = resolve(target, path, true)? {
                *slot = value.clone();
            }
        }
        PatchOp::Merge { path, value } => {
            let (slot, label) = match path {
                Some(path) => (resolve(target, path, true)?, path.as_str()),
                None => (Some(target), ROOT),
            };
            if let Some(slot) = slot {
                merge_into(slot, value, label)?;
            }
        }
        PatchOp::Insert { path, value } => {
            let path = path
                .as_deref()
                .ok_or(PatchError::MissingPath { op: "insert" })?;
            let Some(slot) = resolve(target, path, true)? else {
                return Ok(());
            };
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else {
                return Err(PatchError::NotASequence {
                    path: path.to_string(),
                });
            };
            match value {
                Value::Array(new_items) => items.extend(new_items.iter().cloned()),
                item => items.push(item.clone()),
            }
        }
        PatchOp::Remove { path, value, key } => {
            let path = path
                .as_deref()
                .ok_or(PatchError::MissingPath { op: "remove" })?;
            let Some(slot) = resolve(target, path, false)? else {
                // nothing to remove from
                return Ok(());
            };
            match slot {
                Value::Null => {}
                Value::Array(items) => {
                    let key = key.as_deref().unwrap_or(DEFAULT_IDENTITY_KEY);
                    items.retain(|item| !identity_matches(item, value, key));
                }
                _ => {
                    return Err(PatchError::NotASequence {
                        path: path.to_string(),
                    })
                }
            }
        }
    }
    Ok(())
}

fn merge_into(slot: &mut Value, partial: &Value, label: &str) -> Result<(), PatchError> {
    let Value::Object(partial) = partial else {
        return Err(PatchError::NotARecord {
            path: label.to_string(),
        });
    };
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    let Value::Object(record) = slot else {
        return Err(PatchError::NotARecord {
            path: label.to_string(),
        });
    };
    for (field, field_value) in partial {
        record.insert(field.clone(), field_value.clone());
    }
    Ok(())
}

/// Walks a dotted path. With `create`, missing records along the way are
/// created; without it, a missing segment resolves to `None`.
fn resolve<'a>(
    root: &'a mut Value,
    path: &str,
    create: bool,
) -> Result<Option<&'a mut Value>, PatchError> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(PatchError::InvalidPath {
            path: path.to_string(),
        });
    }

    let mut current = root;
    for segment in path.split('.') {
        if current.is_null() {
            if !create {
                return Ok(None);
            }
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(record) => {
                if create {
                    record.entry(segment.to_string()).or_insert(Value::Null)
                } else {
                    match record.get_mut(segment) {
                        Some(field) => field,
                        None => return Ok(None),
                    }
                }
            }
            _ => {
                return Err(PatchError::PathBlocked {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
        };
    }
    Ok(Some(current))
}

fn identity_matches(item: &Value, identity: &Value, key: &str) -> bool {
    let identity = match identity {
        Value::Object(record) => match record.get(key) {
            Some(id) => id,
            None => return item == identity,
        },
        scalar => scalar,
    };
    if item == identity {
        return true;
    }
    match item {
        Value::Object(record) => record.get(key) == Some(identity),
        _ => false,
    }
}
