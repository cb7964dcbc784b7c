use std::any::Any;

use crate::{
    patch::{error::PatchError, patch_op::PatchOp},
    types::{Revision, Value},
};

/// The peer-side mirror of a replicated object.
///
/// Callbacks arrive strictly in revision order: `on_patch` for revision `r`
/// is only ever called after everything below `r` was delivered.
pub trait ClientObject: Any + Send {
    fn on_replace(&mut self, rev: Revision, value: Value);

    /// An error means the mirror can no longer follow the host and must be
    /// resynced from a snapshot.
    fn on_patch(&mut self, rev: Revision, ops: &[PatchOp]) -> Result<(), PatchError>;

    fn as_any(&self) -> &dyn Any;
}
