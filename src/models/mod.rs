pub mod event_participants;
pub mod events;
pub mod members;

pub use event_participants::EventParticipantRow;
pub use events::EventRow;
pub use members::MemberRow;
