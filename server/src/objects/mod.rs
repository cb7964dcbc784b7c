mod host_keyed_list;
mod host_list;
mod host_value;

pub use host_keyed_list::HostKeyedList;
pub use host_list::HostList;
pub use host_value::HostValue;
