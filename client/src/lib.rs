//! # Replica Client
//! The peer side of object replication: one mirror per host object, fed
//! through a Reconciler that turns a reordered, lossy stream of snapshots
//! and patches into gap-free revisions, with acks and resync requests
//! flowing back to the host.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod client_config;
mod events;
mod mirrors;
mod reconciler;
mod session;

pub use client_config::ClientConfig;
pub use events::ClientEvent;
pub use mirrors::ValueMirror;
pub use reconciler::{PatchOutcome, ReadyStep, Reconciler, ReconcilerConfig};
pub use session::PeerSession;
