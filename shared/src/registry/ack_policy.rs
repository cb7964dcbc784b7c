use std::time::Duration;

use crate::types::Revision;

pub const DEFAULT_INCREMENTAL_MAX: Revision = 32;
pub const DEFAULT_LOG_RETENTION: usize = 128;
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// What the host does for a peer that cannot be served incrementally
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FallbackStrategy {
    /// Push a full snapshot right away
    #[default]
    Snapshot,
    /// Push nothing; the peer notices the gap and asks via `object:request`
    OnRequest,
    /// Keep pushing patches regardless of how far behind the peer is
    None,
}

/// Acknowledgment policy of one object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckPolicy {
    /// How many revisions a peer may trail (by ack) and still be patched
    pub incremental_max: Revision,
    pub fallback: FallbackStrategy,
}

impl AckPolicy {
    pub fn new(incremental_max: Revision, fallback: FallbackStrategy) -> Self {
        Self {
            incremental_max,
            fallback,
        }
    }

    /// Whether a peer acknowledged at `acked` can be moved to `target` with
    /// patches alone
    pub fn within_incremental(&self, acked: Revision, target: Revision) -> bool {
        target <= acked.saturating_add(self.incremental_max)
    }
}

impl Default for AckPolicy {
    fn default() -> Self {
        Self {
            incremental_max: DEFAULT_INCREMENTAL_MAX,
            fallback: FallbackStrategy::default(),
        }
    }
}
