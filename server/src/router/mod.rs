mod command;
mod command_context;
mod dispatch;
mod sync_model;

pub use command::{parse_body, Command, RateLimitKey};
pub use command_context::CommandContext;
pub use dispatch::{DispatchOutcome, DropReason};
pub use sync_model::SyncModel;

pub(crate) use sync_model::CommandDispatcher;
