use replica_shared::{AckPolicy, FallbackStrategy, Revision};

/// How a freshly published revision reaches one peer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Patch,
    Snapshot,
    Skip,
}

/// Patch while the peer's ack is within `incremental_max` of `rev`,
/// otherwise (or without any ack yet) fall back per policy.
pub fn plan_delivery(policy: &AckPolicy, acked: Option<Revision>, rev: Revision) -> Delivery {
    if let Some(acked) = acked {
        if policy.within_incremental(acked, rev) {
            return Delivery::Patch;
        }
    }
    match policy.fallback {
        FallbackStrategy::Snapshot => Delivery::Snapshot,
        FallbackStrategy::OnRequest => Delivery::Skip,
        FallbackStrategy::None => Delivery::Patch,
    }
}
