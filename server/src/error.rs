use thiserror::Error;

use replica_shared::{MessageError, ObjectId, RegistryError, ReplicaError};

/// Errors surfaced by host-side operations
///
/// None of these are fatal to the host: the router turns them into a
/// dropped message plus a log line, and recovery happens through the
/// request/snapshot path.
#[derive(Debug, Error)]
pub enum HostError {
    /// No host object is registered under this id
    #[error("Unknown object {id}")]
    UnknownObject { id: ObjectId },

    /// An object was inserted twice into the engine
    #[error("Object {id} already exists on this host")]
    DuplicateObject { id: ObjectId },

    /// Typed access asked for the wrong concrete object kind
    #[error("Object {id} is not a {expected}")]
    ObjectKindMismatch { id: ObjectId, expected: &'static str },

    /// A keyed-list record does not carry its key field
    #[error("Record for object {id} is missing key field '{key}'")]
    MissingKey { id: ObjectId, key: String },

    /// A keyed-list entry that was expected to exist does not
    #[error("Object {id} has no entry {entry}")]
    UnknownEntry { id: ObjectId, entry: String },

    /// A value that had to be a record was not one
    #[error("Expected a record for object {id}")]
    NotARecord { id: ObjectId },

    /// Two sync models tried to claim the same command kind
    #[error("Command kind '{kind}' is already claimed by sync model '{model}'")]
    DuplicateCommandKind { kind: String, model: String },

    #[error(transparent)]
    Replica(#[from] ReplicaError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Message(#[from] MessageError),
}
