//! # Replica Server
//! The authoritative side of object replication: owns every shared object,
//! publishes revisions as patches or snapshots to connected peers, and
//! routes peer commands through parsing, authorization and rate limiting.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;

mod engine;
mod error;
mod objects;
mod rate_limiter;
mod router;
mod server;
mod user;

pub use engine::{plan_delivery, AckTracker, Delivery, ReplicationEngine};
pub use error::HostError;
pub use objects::{HostKeyedList, HostList, HostValue};
pub use rate_limiter::{RateLimitConfig, RateLimiters, SlidingWindowLimiter};
pub use router::{
    parse_body, Command, CommandContext, DispatchOutcome, DropReason, RateLimitKey, SyncModel,
};
pub use server::{HostConfig, HostRouter, RosterBinding, REQUEST_LIMITER};
pub use transport::{MessageTarget, PeerTransport};
pub use user::{ParticipantId, Participants};
