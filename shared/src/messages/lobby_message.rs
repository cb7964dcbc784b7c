use serde::{Deserialize, Serialize};

use crate::{messages::error::MessageError, types::Value};

/// Prefix shared by the built-in object-protocol kinds.
pub const OBJECT_KIND_PREFIX: &str = "object:";

/// The transport-agnostic envelope every message travels in: a `kind`
/// discriminator plus a free-form `body`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LobbyMessage {
    pub kind: String,
    #[serde(default)]
    pub body: Value,
}

impl LobbyMessage {
    pub fn new(kind: impl Into<String>, body: Value) -> Self {
        Self {
            kind: kind.into(),
            body,
        }
    }

    pub fn is_object_protocol(&self) -> bool {
        self.kind.starts_with(OBJECT_KIND_PREFIX)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(self).map_err(|err| MessageError::EncodeFailed {
            kind: self.kind.clone(),
            reason: err.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        serde_json::from_slice(bytes).map_err(|err| MessageError::DecodeFailed {
            reason: err.to_string(),
        })
    }
}
