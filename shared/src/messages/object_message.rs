use serde::{Deserialize, Serialize};

use crate::{
    messages::{error::MessageError, lobby_message::LobbyMessage},
    patch::patch_op::PatchOp,
    types::{ObjectId, Revision, Value},
};

pub const OBJECT_REQUEST: &str = "object:request";
pub const OBJECT_REPLACE: &str = "object:replace";
pub const OBJECT_PATCH: &str = "object:patch";
pub const OBJECT_ACK: &str = "object:ack";

/// Built-in object-protocol messages. Serialized adjacently tagged, so the
/// encoded form is exactly a `LobbyMessage` envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body")]
pub enum ObjectMessage {
    /// Peer asks for current state, optionally incremental from a known
    /// revision
    #[serde(rename = "object:request", rename_all = "camelCase")]
    Request {
        id: ObjectId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        since_rev: Option<Revision>,
    },
    /// Full snapshot push
    #[serde(rename = "object:replace")]
    Replace {
        id: ObjectId,
        rev: Revision,
        value: Value,
    },
    /// Incremental patch push
    #[serde(rename = "object:patch")]
    Patch {
        id: ObjectId,
        rev: Revision,
        ops: Vec<PatchOp>,
    },
    /// Peer confirms it has applied everything up to `rev`
    #[serde(rename = "object:ack")]
    Ack { id: ObjectId, rev: Revision },
}

impl ObjectMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ObjectMessage::Request { .. } => OBJECT_REQUEST,
            ObjectMessage::Replace { .. } => OBJECT_REPLACE,
            ObjectMessage::Patch { .. } => OBJECT_PATCH,
            ObjectMessage::Ack { .. } => OBJECT_ACK,
        }
    }

    pub fn object_id(&self) -> &ObjectId {
        match self {
            ObjectMessage::Request { id, .. }
            | ObjectMessage::Replace { id, .. }
            | ObjectMessage::Patch { id, .. }
            | ObjectMessage::Ack { id, .. } => id,
        }
    }

    pub fn to_lobby(&self) -> Result<LobbyMessage, MessageError> {
        let encoded = serde_json::to_value(self).map_err(|err| MessageError::EncodeFailed {
            kind: self.kind().to_string(),
            reason: err.to_string(),
        })?;
        serde_json::from_value(encoded).map_err(|err| MessageError::EncodeFailed {
            kind: self.kind().to_string(),
            reason: err.to_string(),
        })
    }

    pub fn from_lobby(message: &LobbyMessage) -> Result<Self, MessageError> {
        match message.kind.as_str() {
            OBJECT_REQUEST | OBJECT_REPLACE | OBJECT_PATCH | OBJECT_ACK => {}
            other => {
                return Err(MessageError::NotAnObjectMessage {
                    kind: other.to_string(),
                })
            }
        }
        let encoded = serde_json::to_value(message).map_err(|err| MessageError::MalformedBody {
            kind: message.kind.clone(),
            reason: err.to_string(),
        })?;
        serde_json::from_value(encoded).map_err(|err| MessageError::MalformedBody {
            kind: message.kind.clone(),
            reason: err.to_string(),
        })
    }
}

impl TryFrom<&LobbyMessage> for ObjectMessage {
    type Error = MessageError;

    fn try_from(message: &LobbyMessage) -> Result<Self, Self::Error> {
        Self::from_lobby(message)
    }
}
