mod ack_tracker;
mod delivery;
mod replication_engine;

pub use ack_tracker::AckTracker;
pub use delivery::{plan_delivery, Delivery};
pub use replication_engine::ReplicationEngine;
