pub mod error;
pub mod lobby_message;
pub mod object_message;
