pub mod ack_policy;
pub mod descriptor;
pub mod descriptor_registry;
pub mod error;
