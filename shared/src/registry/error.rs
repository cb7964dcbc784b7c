use thiserror::Error;

use crate::types::ObjectId;

/// Errors that can occur while registering descriptors or building the
/// objects they describe
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Each object id can be registered once per registry
    #[error("Descriptor for object {id} is already registered")]
    DuplicateId { id: ObjectId },

    /// A host factory asked for a dependency that has not been built
    #[error("Object {id} depends on {dependency}, which does not exist yet")]
    MissingDependency { id: ObjectId, dependency: ObjectId },

    /// A host factory produced an object under another id
    #[error("Host factory for {expected} produced object {actual}")]
    IdMismatch { expected: ObjectId, actual: ObjectId },

    /// Application-level factory failure
    #[error("Host factory for {id} failed: {reason}")]
    FactoryFailed { id: ObjectId, reason: String },
}
