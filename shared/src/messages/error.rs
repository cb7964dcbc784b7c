use thiserror::Error;

/// Errors that can occur while encoding or decoding wire messages
///
/// Decoding errors come from peer input and are never fatal: callers log
/// them and drop the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Envelope could not be serialized
    #[error("Failed to encode message '{kind}': {reason}")]
    EncodeFailed { kind: String, reason: String },

    /// Bytes did not contain a valid `{kind, body}` envelope
    #[error("Failed to decode message envelope: {reason}")]
    DecodeFailed { reason: String },

    /// Envelope kind is not one of the built-in object-protocol kinds
    #[error("Message kind '{kind}' is not an object-protocol message")]
    NotAnObjectMessage { kind: String },

    /// Body did not match the shape required by its kind
    #[error("Malformed body for message kind '{kind}': {reason}")]
    MalformedBody { kind: String, reason: String },
}
