//! # Replica Shared
//! Common functionality shared between replica-server & replica-client
//! crates: the revision/patch vocabulary, wire messages, the replication
//! primitive and the object registry.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod backends;
mod messages;
mod object;
mod patch;
mod registry;
mod transport;
mod types;

pub use backends::{Instant, Timer};
pub use messages::{
    error::MessageError,
    lobby_message::{LobbyMessage, OBJECT_KIND_PREFIX},
    object_message::{ObjectMessage, OBJECT_ACK, OBJECT_PATCH, OBJECT_REPLACE, OBJECT_REQUEST},
};
pub use object::{
    client_object::ClientObject,
    error::ReplicaError,
    host_object::HostObject,
    patch_log::PatchLog,
    replica::{CatchUp, Replica},
    snapshot::{PatchEntry, Snapshot},
};
pub use patch::{
    apply::apply_ops,
    error::PatchError,
    patch_op::{PatchOp, PatchOpKind, DEFAULT_IDENTITY_KEY},
};
pub use registry::{
    ack_policy::{
        AckPolicy, FallbackStrategy, DEFAULT_INCREMENTAL_MAX, DEFAULT_LOG_RETENTION,
        DEFAULT_STALL_TIMEOUT,
    },
    descriptor::{
        ClientFactory, HostFactory, HostFactoryContext, HostObjectLookup, HostSeed,
        ObjectDescriptor, PeerConnectAction, PeerConnectHook,
    },
    descriptor_registry::{DescriptorRegistry, DescriptorSubscription},
    error::RegistryError,
};
pub use transport::error::TransportError;
pub use types::{ObjectId, PeerId, Revision, Value};
