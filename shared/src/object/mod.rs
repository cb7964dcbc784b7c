pub mod client_object;
pub mod error;
pub mod host_object;
pub mod patch_log;
pub mod replica;
pub mod snapshot;
