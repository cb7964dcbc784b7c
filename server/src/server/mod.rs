mod host_router;
pub use host_router::{HostRouter, REQUEST_LIMITER};

mod server_config;
pub use server_config::{HostConfig, RosterBinding};
