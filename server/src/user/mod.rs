mod participants;

pub use participants::{ParticipantId, Participants};
