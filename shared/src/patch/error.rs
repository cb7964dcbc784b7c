use thiserror::Error;

/// Errors that can occur while folding patch operations into a value
///
/// A failing patch never leaves a value half-modified: `apply_ops` works on a
/// copy, so any of these errors means the whole operation list was discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// A mutation must carry at least one operation
    #[error("Patch carries no operations")]
    EmptyPatch,

    /// `insert` and `remove` address a named sequence field and need a path
    #[error("Patch operation '{op}' requires a path")]
    MissingPath { op: &'static str },

    /// A path segment was empty (e.g. `"a..b"` or `""`)
    #[error("Invalid patch path '{path}'")]
    InvalidPath { path: String },

    /// `merge` payload or target is not a record
    #[error("Cannot merge into '{path}': target or payload is not a record")]
    NotARecord { path: String },

    /// `insert`/`remove` target is not a sequence
    #[error("Field '{path}' is not a sequence")]
    NotASequence { path: String },

    /// An intermediate path segment resolved to a non-record value
    #[error("Cannot descend into '{segment}' of '{path}': not a record")]
    PathBlocked { path: String, segment: String },
}
