use std::default::Default;

use replica_shared::ObjectId;

use crate::{rate_limiter::RateLimitConfig, transport::OutboxConfig};

/// Where the participant roster lives, so the Host Router can drop a
/// participant's entry when their peer disconnects
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterBinding {
    /// Object holding the roster
    pub object: ObjectId,
    /// Sequence field of that object holding one record per participant
    pub field: String,
    /// Record field carrying the participant id
    pub key: String,
}

impl RosterBinding {
    pub fn new(
        object: impl Into<ObjectId>,
        field: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            object: object.into(),
            field: field.into(),
            key: key.into(),
        }
    }
}

/// Contains Config properties which will be used by the Host Router
#[derive(Clone, Debug, Default)]
pub struct HostConfig {
    /// Admission of `object:request` messages, keyed per peer
    pub request_limit: RateLimitConfig,
    /// Used to configure the per-peer outbound queue
    pub outbox: OutboxConfig,
    /// Roster cleaned up on peer disconnect, if any
    pub roster: Option<RosterBinding>,
}
