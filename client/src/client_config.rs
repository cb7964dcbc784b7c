use std::{default::Default, time::Duration};

use replica_shared::DEFAULT_STALL_TIMEOUT;

use crate::reconciler::ReconcilerConfig;

/// Contains Config properties which will be used by a PeerSession
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Out-of-order patches held per object before further ones are dropped
    pub max_buffered_patches: usize,
    /// Stall timeout for objects seen before their descriptor
    pub stall_timeout: Duration,
    /// The session is left when nothing has been heard from the host for
    /// this long
    pub session_timeout: Duration,
}

impl ClientConfig {
    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            max_buffered_patches: self.max_buffered_patches,
            stall_timeout: self.stall_timeout,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_buffered_patches: 64,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            session_timeout: Duration::from_secs(10),
        }
    }
}
