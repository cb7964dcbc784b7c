use thiserror::Error;

use crate::{
    patch::error::PatchError,
    types::{ObjectId, Revision},
};

/// Errors that can occur when mutating the authoritative copy of an object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicaError {
    /// `initialize` is a one-time first publish
    #[error("Object {id} is already initialized at revision {revision}")]
    AlreadyInitialized { id: ObjectId, revision: Revision },

    /// Patches can only be applied after the first publish
    #[error("Object {id} has not been initialized")]
    NotInitialized { id: ObjectId },

    /// The operations could not be applied; nothing was changed
    #[error("Patch rejected for object {id}: {source}")]
    Patch {
        id: ObjectId,
        #[source]
        source: PatchError,
    },
}
